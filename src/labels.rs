//! Canonical monster characteristics and the label dictionary that maps wiki
//! labels onto them.
//!
//! The wiki renders labels in Russian; older exports used English display
//! labels. Both spellings resolve to the same [`StatField`], and so does the
//! canonical key itself, which keeps normalization idempotent.

use std::fmt;

/// Closed set of statistics the collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatField {
    Level,
    Hp,
    Mp,
    PAtk,
    MAtk,
    PDef,
    MDef,
    Accuracy,
    Evasion,
    Exp,
    Sp,
    RespawnTime,
    AttackAttribute,
    DefenceAttribute,
    DefenceAttributes,
}

impl StatField {
    pub const ALL: [StatField; 15] = [
        StatField::Level,
        StatField::Hp,
        StatField::Mp,
        StatField::PAtk,
        StatField::MAtk,
        StatField::PDef,
        StatField::MDef,
        StatField::Accuracy,
        StatField::Evasion,
        StatField::Exp,
        StatField::Sp,
        StatField::RespawnTime,
        StatField::AttackAttribute,
        StatField::DefenceAttribute,
        StatField::DefenceAttributes,
    ];

    /// Canonical JSON key.
    pub fn key(self) -> &'static str {
        match self {
            StatField::Level => "level",
            StatField::Hp => "hp",
            StatField::Mp => "mp",
            StatField::PAtk => "pAtk",
            StatField::MAtk => "mAtk",
            StatField::PDef => "pDef",
            StatField::MDef => "mDef",
            StatField::Accuracy => "accuracy",
            StatField::Evasion => "evasion",
            StatField::Exp => "exp",
            StatField::Sp => "sp",
            StatField::RespawnTime => "respawnTime",
            StatField::AttackAttribute => "attackAttribute",
            StatField::DefenceAttribute => "defenceAttribute",
            StatField::DefenceAttributes => "defenceAttributes",
        }
    }

    /// Label as printed in the wiki's stats table.
    pub fn wiki_label(self) -> &'static str {
        match self {
            StatField::Level => "Уровень",
            StatField::Hp => "HP",
            StatField::Mp => "MP",
            StatField::PAtk => "Физ. Атк.",
            StatField::MAtk => "Маг. Атк.",
            StatField::PDef => "Физ. Защ.",
            StatField::MDef => "Маг. Защ.",
            StatField::Accuracy => "Точность",
            StatField::Evasion => "Уклонение",
            StatField::Exp => "Опыт",
            StatField::Sp => "SP",
            StatField::RespawnTime => "Время возрождения",
            StatField::AttackAttribute => "Атрибут атаки",
            StatField::DefenceAttribute => "Атрибут защиты",
            StatField::DefenceAttributes => "Атрибуты защиты",
        }
    }

    /// Resolve a wiki label, an English display label or a canonical key.
    pub fn from_label(label: &str) -> Option<StatField> {
        let field = match label.trim() {
            "Уровень" | "Level" | "level" => StatField::Level,
            "HP" | "hp" => StatField::Hp,
            "MP" | "mp" => StatField::Mp,
            "Физ. Атк." | "P.Atk." | "pAtk" => StatField::PAtk,
            "Маг. Атк." | "M.Atk." | "mAtk" => StatField::MAtk,
            "Физ. Защ." | "P.Def." | "pDef" => StatField::PDef,
            "Маг. Защ." | "M.Def." | "mDef" => StatField::MDef,
            "Точность" | "Accuracy" | "accuracy" => StatField::Accuracy,
            "Уклонение" | "Evasion" | "evasion" => StatField::Evasion,
            "Опыт" | "EXP" | "exp" => StatField::Exp,
            "SP" | "sp" => StatField::Sp,
            "Время возрождения" | "Respawn Time" | "RespawnTime" | "respawnTime" => {
                StatField::RespawnTime
            }
            "Атрибут атаки" | "Attack Attribute" | "attackAttribute" => StatField::AttackAttribute,
            "Атрибут защиты" | "Defence Attribute" | "defenceAttribute" => {
                StatField::DefenceAttribute
            }
            "Defence Attributes" | "defenceAttributes" => StatField::DefenceAttributes,
            other if is_defence_attributes_label(other) => StatField::DefenceAttributes,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The defence-attributes row is labelled "Атрибуты защиты" but the wiki
/// sometimes abbreviates or wraps it.
pub fn is_defence_attributes_label(label: &str) -> bool {
    label.contains("Атрибуты защ")
}

/// Marker that opens the item section inside the stats table.
pub fn is_drop_section_marker(label: &str) -> bool {
    label.contains("Предмет")
}

/// Currency rows ("Адена", "Сундук с сокровищами Адены", ...) share the loot
/// tables with real items.
pub fn is_currency_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("адены") || lower.contains("адена") || lower.contains("adena")
}

/// True when a loot-table row is really a monster statistic or a currency row.
pub fn is_monster_characteristic(label: &str) -> bool {
    let label = label.trim();
    StatField::ALL.iter().any(|f| f.wiki_label() == label)
        || is_defence_attributes_label(label)
        || is_currency_label(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_resolves_from_key_and_wiki_label() {
        for field in StatField::ALL {
            assert_eq!(StatField::from_label(field.key()), Some(field));
            assert_eq!(StatField::from_label(field.wiki_label()), Some(field));
        }
    }

    #[test]
    fn test_english_labels() {
        assert_eq!(StatField::from_label("P.Atk."), Some(StatField::PAtk));
        assert_eq!(StatField::from_label("EXP"), Some(StatField::Exp));
        assert_eq!(
            StatField::from_label("Respawn Time"),
            Some(StatField::RespawnTime)
        );
        assert_eq!(StatField::from_label("Скорость"), None);
    }

    #[test]
    fn test_monster_characteristic_filter() {
        assert!(is_monster_characteristic("Уровень"));
        assert!(is_monster_characteristic("Атрибуты защиты"));
        assert!(is_monster_characteristic("Адена"));
        assert!(is_monster_characteristic("Сундук с сокровищами Адены"));
        assert!(!is_monster_characteristic("Кожа животного"));
        assert!(!is_monster_characteristic("Кость"));
    }
}
