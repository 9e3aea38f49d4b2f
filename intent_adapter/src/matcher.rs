//! Candidate validation - checks one installed parser against the tags
//! found in an utterance and scores the result

use crate::builder::IntentParser;
use crate::types::{Tag, TagSource};
use std::cmp::Ordering;

/// Weight of the coverage term in the final confidence.
const COVERAGE_WEIGHT: f64 = 0.5;

/// Complete tag assignments scored per parser before the search stops.
const MAX_ASSIGNMENTS: usize = 1024;

/// A parser that accepted the utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserMatch {
    pub confidence: f64,
    pub used: Vec<Tag>,
}

/// One position to fill: any tag providing one of `entities`.
struct Slot<'p> {
    entities: Vec<&'p str>,
    optional: bool,
}

struct Search<'a> {
    tags: &'a [Tag],
    context: &'a [Tag],
    utterance: &'a str,
    explored: usize,
    best: Option<(f64, Vec<&'a Tag>)>,
}

/// Validate `parser` against utterance `tags` and `context` tags.
///
/// Returns `None` when an excluded entity was tagged, a required entity
/// is missing, or an at-least-one group has no tagged member. Each tag is
/// consumed at most once and overlapping tags are never both used. Every
/// non-overlapping assignment is scored and the best one wins.
pub fn match_parser(parser: &IntentParser, tags: &[Tag], context: &[Tag], utterance: &str) -> Option<ParserMatch> {
    if parser
        .excluded
        .iter()
        .any(|ex| tags.iter().any(|t| t.provides(ex)))
    {
        return None;
    }

    let slots: Vec<Slot> = parser
        .requires
        .iter()
        .map(|entity| Slot { entities: vec![entity.as_str()], optional: false })
        .chain(parser.at_least_one.iter().map(|group| Slot {
            entities: group.iter().map(String::as_str).collect(),
            optional: false,
        }))
        .chain(
            parser
                .optional
                .iter()
                .map(|entity| Slot { entities: vec![entity.as_str()], optional: true }),
        )
        .collect();

    let mut search = Search {
        tags,
        context,
        utterance,
        explored: 0,
        best: None,
    };
    search.run(&slots, &mut Vec::new());

    let (confidence, used) = search.best?;
    Some(ParserMatch {
        confidence,
        used: used.into_iter().cloned().collect(),
    })
}

impl<'a> Search<'a> {
    fn run(&mut self, slots: &[Slot<'_>], used: &mut Vec<&'a Tag>) {
        if self.explored >= MAX_ASSIGNMENTS {
            return;
        }

        let Some((slot, rest)) = slots.split_first() else {
            self.explored += 1;
            if used.is_empty() {
                return;
            }
            let score = confidence(used, self.utterance);
            // strictly greater keeps the earliest assignment on ties
            if self.best.as_ref().map_or(true, |(best, _)| score > *best) {
                self.best = Some((score, used.clone()));
            }
            return;
        };

        let options = self.options(&slot.entities, used);
        if options.is_empty() {
            if slot.optional {
                self.run(rest, used);
            }
            return;
        }

        for tag in options {
            used.push(tag);
            self.run(rest, used);
            used.pop();
        }
    }

    /// Unused tags providing any of `entities`, highest confidence first,
    /// leftmost on ties. Context tags are only offered when the utterance
    /// has none left.
    fn options(&self, entities: &[&str], used: &[&'a Tag]) -> Vec<&'a Tag> {
        let provides = |t: &Tag| entities.iter().any(|e| t.provides(e));

        let mut found: Vec<&'a Tag> = self
            .tags
            .iter()
            .filter(|t| provides(*t) && !used.iter().any(|u| u.overlaps(*t)))
            .collect();
        if found.is_empty() {
            found = self
                .context
                .iter()
                .filter(|t| provides(*t) && !used.iter().any(|u| std::ptr::eq(*u, *t)))
                .collect();
        }

        found.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
        found
    }
}

fn confidence(used: &[&Tag], utterance: &str) -> f64 {
    let content = non_whitespace_len(utterance);
    let covered: usize = used
        .iter()
        .filter(|t| t.source != TagSource::Context)
        .map(|t| non_whitespace_len(&t.text))
        .sum();
    let coverage = if content == 0 {
        0.0
    } else {
        (covered as f64 / content as f64).min(1.0)
    };

    let mean = used.iter().map(|t| t.confidence).sum::<f64>() / used.len() as f64;
    let score = mean * ((1.0 - COVERAGE_WEIGHT) + COVERAGE_WEIGHT * coverage);
    score.clamp(0.0, 1.0)
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
