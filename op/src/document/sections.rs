//! Fixed lookup tables for the documents

use chrono::{Datelike, NaiveDate};

/// Formal plan section for a question position
pub fn formal_section(position: i64) -> Option<&'static str> {
    let name = match position {
        1..=4 => "1. Partijen & juridische context",
        5..=6 => "2. Kinderen: gegevens & betrokkenheid",
        7 => "3. Uitgangspunten & gezamenlijke principes",
        8..=12 => "4. Zorgregeling & contact",
        13 => "5. School & huiswerk",
        14..=17 => "6. Gezondheid, documenten & verzekeringen",
        18..=20 => "7. Vakanties, feestdagen & verjaardagen",
        21..=22 => "8. Familie & bijzondere omstandigheden",
        23..=24 => "9. Opvang, sport & hobby's",
        25..=26 => "10. Communicatie & overleg",
        27..=29 => "11. Financiën",
        30..=31 => "12. Verhuizen & nieuwe partner",
        32 => "13. Evaluatie & geschillen",
        33 => "14. Ondertekening",
        _ => return None,
    };
    Some(name)
}

/// Discussion document section for a question position
pub fn discussion_section(position: i64) -> Option<&'static str> {
    let name = match position {
        1..=2 => "Over jullie en de kinderen",
        3 => "Wat vinden jullie belangrijk?",
        4 => "Hoe gaan jullie met elkaar om?",
        5..=9 => "De zorgregeling",
        10..=11 => "Praktische afspraken in het dagelijks leven",
        12 => "Sport, hobby's en activiteiten",
        13 => "School en ontwikkeling",
        14..=15 => "Gezondheid en medische zorg",
        16 => "Opvoeding en huisregels",
        17 => "Opvang en hulp",
        18 => "Als iemand wil verhuizen",
        19..=20 => "Kosten en geld",
        _ => return None,
    };
    Some(name)
}

/// Short formal clause title for a question id
pub fn clause_title(id: &str) -> Option<&'static str> {
    let title = match id {
        "ouders_identiteit_0" => "Gegevens van de ouders",
        "juridische_situatie_1a" => "Burgerlijke staat",
        "gezag_1b" => "Gezag",
        "relatie_tijdlijn_1c" => "Tijdlijn relatie",
        "kinderen_identiteit_2" => "Gegevens van de kinderen",
        "betrokkenheid_kinderen_3" => "Betrokkenheid van de kinderen",
        "waarden_principes_4" => "Gezamenlijke principes",
        "hoofdverblijf_5a" => "Hoofdverblijfplaats",
        "kinderbijslag_budget_5b" => "Kinderbijslag en kindgebonden budget",
        "zorgverdeling_week_6" => "Weekritme zorgverdeling",
        "wissels_vervoer_7" => "Overdrachten en vervoer",
        "contact_met_andere_ouder_8" => "Contact met de andere ouder",
        "school_beleid_9" => "School en onderwijs",
        "medisch_beleid_10" => "Medische zorg",
        "identiteit_documenten_11a" => "Identiteitsdocumenten",
        "reistoestemming_11b" => "Reistoestemming buitenland",
        "verzekeringen_12" => "Verzekeringen",
        "vakanties_13" => "Schoolvakanties",
        "feestdagen_14" => "Feestdagen",
        "verjaardagen_15" => "Verjaardagen",
        "familie_contacten_16a" => "Contact met familie",
        "overlijden_ouder_16b" => "Bij overlijden ouder",
        "opvang_oppas_17" => "Opvang en oppas",
        "sport_hobby_18" => "Sport, muziek en hobby's",
        "communicatie_19a" => "Communicatie tussen ouders",
        "overleg_19b" => "Formeel overleg",
        "financien_20" => "Financiële afspraken",
        "jongmeerderjarig_21" => "Afspraken 18-21 jaar / studiebijdrage",
        "spaarrekeningen_kind_22" => "Spaarrekeningen kind",
        "verhuizen_23" => "Verhuizen",
        "nieuwe_partner_24" => "Introductie nieuwe partner",
        "evaluatie_geschillen_25" => "Evaluatie en geschillenregeling",
        "ondertekening_26" => "Ondertekening",
        _ => return None,
    };
    Some(title)
}

const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

/// Date as "07 maart 2025"
pub fn dutch_date(date: NaiveDate) -> String {
    format!("{:02} {} {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formal_sections_cover_all_positions() {
        let distinct: std::collections::BTreeSet<_> = (1..=33).filter_map(formal_section).collect();
        assert_eq!(distinct.len(), 14);
        assert_eq!(formal_section(4), Some("1. Partijen & juridische context"));
        assert_eq!(formal_section(33), Some("14. Ondertekening"));
        assert_eq!(formal_section(0), None);
        assert_eq!(formal_section(34), None);
    }

    #[test]
    fn test_discussion_sections() {
        assert_eq!(discussion_section(9), Some("De zorgregeling"));
        assert_eq!(discussion_section(20), Some("Kosten en geld"));
        assert_eq!(discussion_section(21), None);
    }

    #[test]
    fn test_clause_title() {
        assert_eq!(clause_title("gezag_1b"), Some("Gezag"));
        assert_eq!(clause_title("unknown"), None);
    }

    #[test]
    fn test_dutch_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(dutch_date(date), "07 maart 2025");
    }
}
