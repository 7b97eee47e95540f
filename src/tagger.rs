//! Rule-based word classes and verb finiteness.
//!
//! No statistical model: a closed list of function words, the verb table,
//! the adjective table and the concreteness table (anything rated has a
//! nominal reading) drive a left-to-right pass over each line. The pass only needs to answer three
//! questions reliably: is this a content word, is it a verb, and is that
//! verb the finite head of its verb group.
//!
//! Auxiliaries are absorbed into the verb they support ("is meant" counts
//! once, as "meant"), infinitives after "to" and bare "-ing" participles are
//! non-finite, and a word that can be both noun and verb ("love", "dream")
//! is only a verb right after a subject, auxiliary, modal or "to".

use serde::Serialize;

use crate::lexicon::{FunctionKind, Lexicon, VerbClass};
use crate::models::{Song, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordClass {
    Function,
    Verb,
    Noun,
    Adjective,
    Adverb,
}

impl WordClass {
    /// Noun or adjective
    pub fn is_nominal(self) -> bool {
        matches!(self, WordClass::Noun | WordClass::Adjective)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerbUse {
    pub lemma: String,
    pub class: VerbClass,
    pub finite: bool,
    /// Supports a following verb and is not counted on its own
    pub auxiliary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedWord {
    pub word: String,
    pub class: WordClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<VerbUse>,
}

impl TaggedWord {
    /// Class of the verb if this word heads a finite verb group.
    pub fn finite_verb(&self) -> Option<VerbClass> {
        self.verb
            .as_ref()
            .filter(|v| v.finite && !v.auxiliary)
            .map(|v| v.class)
    }

    pub fn is_content(&self) -> bool {
        self.class != WordClass::Function
    }
}

/// What the previous (non-adverb) word leads us to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Start,
    Subject,
    Be,
    Have,
    Do,
    Modal,
    To,
    Determiner,
    Preposition,
    Conjunction,
    Verb,
    Nominal,
    Other,
}

impl Context {
    fn expects_verb(self) -> bool {
        matches!(
            self,
            Context::Subject | Context::Be | Context::Have | Context::Do | Context::Modal | Context::To
        )
    }

    fn expects_noun(self) -> bool {
        matches!(self, Context::Determiner | Context::Preposition)
    }
}

fn function_context(kind: FunctionKind) -> Context {
    match kind {
        FunctionKind::Subject => Context::Subject,
        FunctionKind::SubjectBe | FunctionKind::AuxBe => Context::Be,
        FunctionKind::SubjectHave | FunctionKind::AuxHave => Context::Have,
        FunctionKind::AuxDo => Context::Do,
        FunctionKind::Modal | FunctionKind::SubjectModal => Context::Modal,
        FunctionKind::To => Context::To,
        FunctionKind::Determiner | FunctionKind::Possessive => Context::Determiner,
        FunctionKind::Preposition => Context::Preposition,
        FunctionKind::Conjunction => Context::Conjunction,
        FunctionKind::Pronoun
        | FunctionKind::Adverb
        | FunctionKind::Interjection
        | FunctionKind::Numeral => Context::Other,
    }
}

/// First word after `from` that is not an adverb or subject pronoun
/// ("is never coming", "are you going").
fn next_content<'a>(lexicon: &Lexicon, tokens: &'a [Token], from: usize) -> Option<&'a str> {
    tokens
        .get(from..)?
        .iter()
        .map(|t| t.norm.as_str())
        .find(|w| !matches!(lexicon.function_kind(w), Some(FunctionKind::Adverb | FunctionKind::Subject)))
}

/// "-ing", "-ed" or an irregular past form ("meant", "been").
fn is_participle(lexicon: &Lexicon, word: &str) -> bool {
    if word.len() > 4
        && (word.ends_with("ing") || word.ends_with("ed"))
        && lexicon.function_kind(word).is_none()
    {
        return true;
    }
    lexicon
        .verb(word)
        .map_or(false, |e| e.lemma != word && !word.ends_with('s'))
}

fn is_past_form(lexicon: &Lexicon, word: &str) -> bool {
    word.ends_with("ed")
        || lexicon
            .verb(word)
            .map_or(false, |e| e.lemma != word && !word.ends_with('s') && !word.ends_with("ing"))
}

/// Whether a be/have/do form supports the verb that follows it.
fn is_auxiliary(lexicon: &Lexicon, kind: FunctionKind, tokens: &[Token], i: usize) -> bool {
    let Some(next) = next_content(lexicon, tokens, i + 1) else {
        return false;
    };
    match kind {
        FunctionKind::AuxDo => match lexicon.function_kind(next) {
            None => !lexicon.is_rated(next) || lexicon.verb(next).is_some(),
            Some(_) => lexicon.verb(next).is_some(),
        },
        _ => is_participle(lexicon, next),
    }
}

const ADJECTIVE_SUFFIXES: [&str; 7] = ["ous", "ful", "less", "ive", "able", "ible", "ish"];

/// Listed adjectives, plus unrated words with an adjective suffix.
fn nominal_class(lexicon: &Lexicon, word: &str, rated: bool) -> WordClass {
    let suffixed = !rated && word.len() > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s));
    if lexicon.is_adjective(word) || suffixed {
        WordClass::Adjective
    } else {
        WordClass::Noun
    }
}

fn main_verb_of(kind: FunctionKind) -> (&'static str, VerbClass) {
    match kind {
        FunctionKind::AuxHave | FunctionKind::SubjectHave => ("have", VerbClass::State),
        FunctionKind::AuxDo => ("do", VerbClass::Action),
        _ => ("be", VerbClass::State),
    }
}

/// Tag one line of tokens.
pub fn tag_line(lexicon: &Lexicon, tokens: &[Token]) -> Vec<TaggedWord> {
    let mut tagged = Vec::with_capacity(tokens.len());
    let mut ctx = Context::Start;

    for (i, token) in tokens.iter().enumerate() {
        let word = token.norm.as_str();
        let kind = lexicon.function_kind(word);
        let entry = lexicon.verb(word);

        // be / have / do, including fused subject forms
        if let Some(
            k @ (FunctionKind::AuxBe
            | FunctionKind::AuxHave
            | FunctionKind::AuxDo
            | FunctionKind::SubjectBe
            | FunctionKind::SubjectHave),
        ) = kind
        {
            let (lemma, class) = main_verb_of(k);
            let auxiliary = is_auxiliary(lexicon, k, tokens, i);
            let finite = ctx != Context::To && !(word.ends_with("ing") && ctx != Context::Be);
            tagged.push(TaggedWord {
                word: word.to_string(),
                class: if auxiliary { WordClass::Function } else { WordClass::Verb },
                verb: Some(VerbUse {
                    lemma: lemma.to_string(),
                    class,
                    finite,
                    auxiliary,
                }),
            });
            ctx = if auxiliary { function_context(k) } else { Context::Verb };
            continue;
        }

        if let Some(k) = kind {
            // "like" and friends: verbs only where a verb is expected
            if let (Some(e), true) = (entry, ctx.expects_verb() && k != FunctionKind::To) {
                tagged.push(TaggedWord {
                    word: word.to_string(),
                    class: WordClass::Verb,
                    verb: Some(VerbUse {
                        lemma: e.lemma.clone(),
                        class: e.class,
                        finite: ctx != Context::To,
                        auxiliary: false,
                    }),
                });
                ctx = Context::Verb;
                continue;
            }
            tagged.push(TaggedWord {
                word: word.to_string(),
                class: WordClass::Function,
                verb: None,
            });
            if k != FunctionKind::Adverb {
                ctx = function_context(k);
            }
            continue;
        }

        let rated = lexicon.is_rated(word);
        let verb = match entry {
            Some(e) => {
                let is_verb = if rated {
                    ctx.expects_verb() || (ctx == Context::Nominal && is_past_form(lexicon, word))
                } else {
                    !ctx.expects_noun()
                };
                is_verb.then(|| (e.lemma.clone(), e.class))
            }
            None if rated || word.ends_with("ly") => None,
            None => {
                let strong = matches!(ctx, Context::Subject | Context::Modal | Context::Do | Context::To);
                let past = word.len() > 4 && word.ends_with("ed") && !ctx.expects_noun();
                (strong || past).then(|| (word.to_string(), VerbClass::Action))
            }
        };

        match verb {
            Some((lemma, class)) => {
                let finite = ctx != Context::To && !(word.ends_with("ing") && ctx != Context::Be);
                tagged.push(TaggedWord {
                    word: word.to_string(),
                    class: WordClass::Verb,
                    verb: Some(VerbUse {
                        lemma,
                        class,
                        finite,
                        auxiliary: false,
                    }),
                });
                ctx = Context::Verb;
            }
            None if !rated && word.len() > 3 && word.ends_with("ly") => {
                tagged.push(TaggedWord {
                    word: word.to_string(),
                    class: WordClass::Adverb,
                    verb: None,
                });
            }
            None => {
                tagged.push(TaggedWord {
                    word: word.to_string(),
                    class: nominal_class(lexicon, word, rated),
                    verb: None,
                });
                ctx = Context::Nominal;
            }
        }
    }

    tagged
}

/// Tags for every line, nested sections → lines → words.
pub fn tag_song(lexicon: &Lexicon, song: &Song) -> Vec<Vec<Vec<TaggedWord>>> {
    song.sections
        .iter()
        .map(|s| s.lines.iter().map(|l| tag_line(lexicon, &l.tokens)).collect())
        .collect()
}
