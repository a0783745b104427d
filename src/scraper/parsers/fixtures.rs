//! HTML fixtures shaped like the wiki's NPC detail pages.

/// A detail page with stats, drop and spoil sections and a skills table.
pub fn mob_page(hp: u32, exp: u32, harbinger: bool) -> String {
    let additional = if harbinger {
        "Ур. 3 Harbinger of Ankou"
    } else {
        "Ур. 3"
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<body>
<div id="result-title">
  <span class="item-name"><span class="item-name__content">Elder Red Keltir
    <span class="item-name__additional">{additional}</span></span></span>
</div>
<div id="result-stats">
<table>
  <tr><td colspan="4">Elder Red Keltir</td></tr>
  <tr><td>Уровень</td><td>3</td><td>Время возрождения</td><td>9s.</td></tr>
  <tr><td>HP</td><td>{hp}</td><td>MP</td><td>67</td></tr>
  <tr><td>Физ. Атк.</td><td>12</td><td>Маг. Атк.</td><td>6</td></tr>
  <tr><td>Физ. Защ.</td><td>48</td><td>Маг. Защ.</td><td>32</td></tr>
  <tr><td>Точность</td><td>29</td><td>Уклонение</td><td>29</td></tr>
  <tr><td>Опыт</td><td>{exp}</td><td>SP</td><td>2</td></tr>
  <tr><td>Атрибут атаки</td><td>Нет</td></tr>
  <tr><td>Атрибуты защиты</td><td>
    <p><span style="color: #f00">Огонь</span>: 20</p>
    <p><span style="color: #00f">Вода</span>: -10</p>
    <p>Уязвимость: 15%</p>
    <p>Святость</p>
  </td></tr>
  <tr><td>HP</td><td>999</td></tr>
  <tr><td>Предмет</td><td>Кол-во</td><td>Шанс</td></tr>
</table>
</div>
<div id="drop">
<table>
  <thead><tr><th>Предмет</th><th>Кол-во</th><th>Шанс</th></tr></thead>
  <tbody>
    <tr><td colspan="3">Шанс группы: 70%</td></tr>
    <tr><td><a class="item-name" href="/item/57-adena/live"><span class="item-name__content">Адена</span></a></td><td>22 - 38</td><td>70%</td></tr>
    <tr><td>Сундук с сокровищами Адены</td><td>10</td><td>70%</td></tr>
    <tr><td><a class="item-name" href="/item/1867-animal-skin/live"><span class="item-name__content">Кожа животного</span></a></td><td>1-2</td><td>45.5%</td></tr>
    <tr><td>Уровень</td><td>3</td><td>1%</td></tr>
    <tr><td>Кость животного</td><td>1</td><td>12%</td></tr>
  </tbody>
</table>
</div>
<div id="spoil">
<table>
  <tbody>
    <tr><td>Предмет</td><td>Кол-во</td><td>Шанс</td></tr>
    <tr><td>Нить</td><td>1-3</td><td>33%</td></tr>
    <tr><td>Клык</td><td>1</td><td>5%</td></tr>
    <tr><td>Пусто</td><td></td><td>5%</td></tr>
  </tbody>
</table>
</div>
<table>
  <tr><th>Умение</th><th>Уровень</th></tr>
  <tr><td>HP Increase (3x)</td><td>1</td></tr>
</table>
</body>
</html>"#
    )
}
