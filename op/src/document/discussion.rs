//! Informal discussion document for mediation

use std::sync::LazyLock;

use chrono::NaiveDate;
use planstate::Question;
use regex::Regex;

use super::layout::{Block, Color, Face, TextStyle};
use super::sections::{discussion_section, dutch_date};

static PLURAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(jullie|we|wij|ons|onze)\b").expect("plural regex is valid"));

const ORANGE: Color = Color::hex(0xe67e22);
const GRAY: Color = Color::hex(0x7f8c8d);
const TEXT: Color = Color::hex(0x34495e);

const TITLE: TextStyle = TextStyle::new(22.0, Face::Bold, ORANGE).centered().spacing(0.0, 3.0);
const SUBTITLE: TextStyle = TextStyle::new(11.0, Face::Italic, GRAY).centered().spacing(0.0, 4.0);
const NOTE: TextStyle = TextStyle::new(9.0, Face::Regular, GRAY).centered().spacing(0.0, 6.0);
const INTRO: TextStyle = TextStyle::new(10.0, Face::Italic, TEXT).spacing(0.0, 6.0);
const SECTION: TextStyle = TextStyle::new(14.0, Face::Bold, Color::hex(0xd35400)).spacing(6.0, 2.0);
const QUESTION: TextStyle = TextStyle::new(11.0, Face::Bold, Color::hex(0x2c3e50)).spacing(3.0, 1.0);
const ANSWER: TextStyle = TextStyle::new(10.5, Face::Regular, TEXT).indent(6.0).spacing(0.0, 3.0);
const QUOTED: TextStyle = TextStyle::new(10.5, Face::Italic, TEXT).indent(6.0).spacing(0.0, 3.0);
const FOOTER: TextStyle = TextStyle::new(8.0, Face::Regular, Color::hex(0x95a5a6)).centered().spacing(10.0, 0.0);

/// Whether an answer speaks for both parents
pub fn speaks_for_both(answer: &str) -> bool {
    PLURAL_RE.is_match(answer)
}

/// Blocks of the discussion document for the completed questions
pub fn blocks(completed: &[&Question], parent_name: &str, date: NaiveDate) -> Vec<Block> {
    let mut blocks = vec![
        Block::text("Gespreksdocument Ouderschapsplan", TITLE),
        Block::text(
            "Een informeel overzicht van de afspraken en gedachten van beide ouders - voor gebruik tijdens mediation of overleg",
            SUBTITLE,
        ),
        Block::text(format!("Gespreksnotitie van {}", dutch_date(date)), NOTE),
        Block::Rule {
            color: Color::hex(0xf0b27a),
            thickness_pt: 1.0,
            space_after_mm: 3.0,
        },
        Block::text(
            format!(
                "Dit document bevat de gedachten en afspraken die {name} gedeeld heeft tijdens het opstellen van \
                 het ouderschapsplan in BeNice. Het is bedoeld als gespreksonderwerp en werkdocument - niet als \
                 juridisch bindend contract. De informatie hieronder weerspiegelt de meningen en wensen van {name} \
                 in eigen woorden.",
                name = parent_name
            ),
            INTRO,
        ),
    ];

    if completed.is_empty() {
        blocks.push(Block::text("Nog geen gespreksonderwerpen besproken.", ANSWER));
    }

    let mut current_section = None;
    for question in completed {
        let section = discussion_section(question.position);
        if let Some(name) = section.filter(|s| Some(*s) != current_section) {
            blocks.push(Block::text(name, SECTION));
            current_section = Some(name);
        }

        blocks.push(Block::text(format!("• {}", question.question), QUESTION));

        let answer = question
            .answer
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("Geen antwoord gegeven");
        if speaks_for_both(answer) {
            blocks.push(Block::text(format!("\"{}\"", answer), QUOTED));
        } else {
            blocks.push(Block::text(answer, ANSWER));
        }
    }

    blocks.push(Block::Rule {
        color: Color::hex(0xe8ebed),
        thickness_pt: 0.5,
        space_after_mm: 2.0,
    });
    blocks.push(Block::text(
        "Gespreksdocument - Voor intern gebruik tijdens mediation en overleg\nOpgesteld met BeNice AI-assistent",
        FOOTER,
    ));

    blocks
}
