//! Formal, signable parenting plan

use chrono::NaiveDate;
use planstate::Question;

use super::layout::{Block, Color, Face, TextStyle};
use super::sections::{clause_title, dutch_date, formal_section};

const DARK: Color = Color::hex(0x2c3e50);
const BLUE: Color = Color::hex(0x1a5490);
const TEXT: Color = Color::hex(0x34495e);
const MUTED: Color = Color::hex(0x7f8c8d);

const TITLE: TextStyle = TextStyle::new(24.0, Face::Bold, DARK).centered().spacing(0.0, 3.0);
const SUBTITLE: TextStyle = TextStyle::new(12.0, Face::Regular, Color::hex(0x5d6d7e)).centered().spacing(0.0, 4.0);
const INFO: TextStyle = TextStyle::new(9.0, Face::Regular, MUTED).centered().spacing(0.0, 6.0);
const SECTION: TextStyle = TextStyle::new(14.0, Face::Bold, BLUE).spacing(6.0, 1.0);
const CLAUSE: TextStyle = TextStyle::new(11.0, Face::Bold, DARK).spacing(3.0, 1.0);
const ANSWER: TextStyle = TextStyle::new(10.5, Face::Regular, TEXT).indent(5.0).spacing(0.0, 3.0);
const SIGNATURE_HEADER: TextStyle = TextStyle::new(16.0, Face::Bold, DARK).centered().spacing(0.0, 6.0);
const DECLARATION: TextStyle = TextStyle::new(10.5, Face::Regular, TEXT).spacing(0.0, 8.0);
const SIGNATURE_LABEL: TextStyle = TextStyle::new(11.0, Face::Bold, BLUE).spacing(4.0, 2.0);
const SIGNATURE_FIELD: TextStyle = TextStyle::new(10.0, Face::Regular, TEXT).spacing(0.0, 3.0);
const FOOTER: TextStyle = TextStyle::new(8.0, Face::Regular, Color::hex(0x95a5a6)).centered();

const FIELD_GAP_MM: f32 = 5.0;
const SIGNATURE_GAP_MM: f32 = 8.0;
const FOOTER_GAP_MM: f32 = 10.0;

const FIELD_LINE: &str = "____________________________________________";

const DECLARATION_TEXT: &str = "Ondergetekenden verklaren dat zij kennis hebben genomen van de inhoud van dit \
     ouderschapsplan en dat zij zich zullen houden aan de gemaakte afspraken. Dit plan is opgesteld in het \
     belang van het kind/de kinderen en zal als uitgangspunt dienen voor de ouderlijke zorg en opvoeding.";

/// Blocks of the formal document for the completed questions
pub fn blocks(completed: &[&Question], date: NaiveDate) -> Vec<Block> {
    let mut blocks = vec![
        Block::text("OUDERSCHAPSPLAN", TITLE),
        Block::text("Afspraken over de zorg en opvoeding van de kinderen", SUBTITLE),
        Block::Rule {
            color: Color::hex(0xbdc3c7),
            thickness_pt: 1.0,
            space_after_mm: 3.0,
        },
        Block::text(format!("Datum opstelling: {}", dutch_date(date)), INFO),
    ];

    if completed.is_empty() {
        blocks.push(Block::text("Nog geen vragen beantwoord.", ANSWER));
    }

    let mut current_section = None;
    for question in completed {
        let section = formal_section(question.position);
        if let Some(name) = section.filter(|s| Some(*s) != current_section) {
            blocks.push(Block::text(name, SECTION));
            blocks.push(Block::Rule {
                color: Color::hex(0xe8ebed),
                thickness_pt: 0.5,
                space_after_mm: 2.0,
            });
            current_section = Some(name);
        }

        let title = clause_title(&question.id).unwrap_or(question.question.as_str());
        blocks.push(Block::text(title, CLAUSE));
        blocks.push(Block::text(answer_text(question), ANSWER));
    }

    blocks.push(Block::PageBreak);
    blocks.push(Block::text("ONDERTEKENING", SIGNATURE_HEADER));
    blocks.push(Block::text(DECLARATION_TEXT, DECLARATION));
    signature_block(&mut blocks, "Ouder 1", "Naam");
    blocks.push(Block::Space(SIGNATURE_GAP_MM));
    signature_block(&mut blocks, "Ouder 2", "Naam");
    blocks.push(Block::Space(SIGNATURE_GAP_MM));
    signature_block(&mut blocks, "Mediator", "Naam gekozen / te kiezen mediator");
    blocks.push(Block::Space(FOOTER_GAP_MM));
    blocks.push(Block::text(
        "Dit ouderschapsplan is opgesteld met behulp van de BeNice.family",
        FOOTER,
    ));

    blocks
}

/// The formal summary, else the raw answer
fn answer_text(question: &Question) -> &str {
    [question.summary.as_deref(), question.answer.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("Geen antwoord")
}

fn signature_block(blocks: &mut Vec<Block>, label: &str, name_label: &str) {
    blocks.push(Block::text(label, SIGNATURE_LABEL));
    for (i, field) in [name_label, "Handtekening", "Datum"].into_iter().enumerate() {
        if i > 0 {
            blocks.push(Block::Space(FIELD_GAP_MM));
        }
        blocks.push(Block::text(format!("{}: {}", field, FIELD_LINE), SIGNATURE_FIELD));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planstate::QuestionStatus;

    fn completed(id: &str, position: i64, summary: Option<&str>, answer: Option<&str>) -> Question {
        let mut q = Question::new(id, position, format!("Vraag {}?", position));
        q.status = QuestionStatus::Completed;
        q.summary = summary.map(str::to_string);
        q.answer = answer.map(str::to_string);
        q
    }

    fn texts(blocks: &[Block]) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn test_section_heading_once_per_section() {
        let q1 = completed("ouders_identiteit_0", 1, Some("Ouders zijn A en B."), None);
        let q2 = completed("gezag_1b", 3, None, Some("Gezamenlijk gezag"));
        let q3 = completed("kinderen_identiteit_2", 5, None, None);
        let blocks = blocks(&[&q1, &q2, &q3], date());
        let texts = texts(&blocks);

        let count = |needle: &str| texts.iter().filter(|t| **t == needle).count();
        assert_eq!(count("1. Partijen & juridische context"), 1);
        assert_eq!(count("2. Kinderen: gegevens & betrokkenheid"), 1);
        assert!(texts.contains(&"Datum opstelling: 07 maart 2025"));
        assert!(texts.contains(&"Gegevens van de ouders"));
        assert!(texts.contains(&"Ouders zijn A en B."));
        assert!(texts.contains(&"Gezamenlijk gezag"));
        assert!(texts.contains(&"Geen antwoord"));
    }

    #[test]
    fn test_unknown_id_uses_question_text() {
        let q = completed("eigen_vraag", 40, None, Some("Ja"));
        let blocks = blocks(&[&q], date());
        let texts = texts(&blocks);
        assert!(texts.contains(&"Vraag 40?"));
    }

    #[test]
    fn test_empty_document_still_has_signature_page() {
        let blocks = blocks(&[], date());
        let texts = texts(&blocks);
        assert!(texts.contains(&"Nog geen vragen beantwoord."));
        assert!(texts.contains(&"ONDERTEKENING"));
        assert!(texts.contains(&"Mediator"));
        assert!(blocks.contains(&Block::PageBreak));
    }

    #[test]
    fn test_signature_page_spacing() {
        let blocks = blocks(&[], date());
        let page_break = blocks.iter().position(|b| *b == Block::PageBreak).unwrap();
        let signature = &blocks[page_break..];

        let field_gaps = signature.iter().filter(|b| **b == Block::Space(FIELD_GAP_MM)).count();
        let block_gaps = signature.iter().filter(|b| **b == Block::Space(SIGNATURE_GAP_MM)).count();
        assert_eq!(field_gaps, 6);
        assert_eq!(block_gaps, 2);
        assert_eq!(signature[signature.len() - 2], Block::Space(FOOTER_GAP_MM));
    }
}
