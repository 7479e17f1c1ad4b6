//! Chapter/verse secondary index.
//!
//! Built by a single linear scan of the main sequence's content streams.
//! The scan tracks the current chapter, verse and verses-range while
//! counting word-like tokens; chapter and verse spans are then packed
//! into per-chapter byte arrays using the record codec in
//! [`crate::format::cv_record`]. The same scan populates the main
//! sequence's token-presence bitset.
//!
//! Lookup by chapter is O(that chapter's index size); readers scan
//! records sequentially and group multi-occurrence verses by the
//! "is last" flag. Unbalanced markup is tolerated: an end scope with no
//! open record, or a verse marker outside any chapter, is logged and
//! skipped rather than aborting the scan.

use crate::enums::{EnumCategory, EnumSet};
use crate::error::{Result, SuccinctError};
use crate::format;
use crate::format::cv_record::{self, CvRecord};
use crate::item::{ItemType, TokenType};
use crate::model::Sequence;
use crate::read;
use pericope_core::{ByteArray, WordBitSet};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::warn;

/// A chapter span under construction.
#[derive(Debug)]
struct OpenChapter {
    start_block: u32,
    start_item: u32,
    next_token: u32,
    end: Option<(u32, u32)>,
}

/// One verse occurrence under construction.
#[derive(Debug)]
struct OpenVerse {
    start_block: u32,
    start_item: u32,
    next_token: u32,
    end: Option<(u32, u32)>,
    verses: Option<String>,
}

/// JS-parseInt-style leading-digit parse, used for verse slot numbering.
fn leading_digits(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Build the chapter and chapter-verse indexes and the token-presence
/// bitset for a main sequence, replacing any previous index state.
pub fn build_chapter_verse_index(sequence: &mut Sequence, enums: &EnumSet) -> Result<()> {
    let mut chapter_indexes: FxHashMap<String, OpenChapter> = FxHashMap::default();
    let mut chapter_verse_indexes: FxHashMap<String, BTreeMap<u32, Vec<OpenVerse>>> =
        FxHashMap::default();

    let mut chapter_n = String::from("0");
    let mut verses = String::from("1");
    let mut next_token: u32 = 0;
    let mut tokens_present = WordBitSet::new(enums.table(EnumCategory::WordLike).len());

    for (block_n, block) in sequence.blocks.iter().enumerate() {
        let content = &block.content;
        let mut pos = 0;
        let mut item_n: u32 = 0;

        while pos < content.len() {
            let (record_len, item_type, subtype) = format::header(content, pos)?;
            match item_type {
                ItemType::StartScope => {
                    let label = read::decode_scope_label(enums, content, pos, subtype)?;
                    if let Some(rest) = label.strip_prefix("chapter/") {
                        chapter_n = rest.to_string();
                        chapter_verse_indexes.insert(chapter_n.clone(), BTreeMap::new());
                        chapter_indexes.insert(
                            chapter_n.clone(),
                            OpenChapter {
                                start_block: block_n as u32,
                                start_item: item_n,
                                next_token,
                                end: None,
                            },
                        );
                    } else if let Some(rest) = label.strip_prefix("verse/") {
                        let Some(verse_n) = leading_digits(rest) else {
                            warn!(label = %label, "verse scope with non-numeric number, skipped");
                            pos += record_len;
                            item_n += 1;
                            continue;
                        };
                        let Some(chapter) = chapter_indexes.get(&chapter_n) else {
                            warn!(label = %label, "verse scope outside any chapter, skipped");
                            pos += record_len;
                            item_n += 1;
                            continue;
                        };
                        let chapter_verses = chapter_verse_indexes
                            .entry(chapter_n.clone())
                            .or_default();

                        // Pre-verse-1 material becomes a synthesized verse 0.
                        if verse_n == 1
                            && !chapter_verses.contains_key(&0)
                            && chapter.next_token < next_token
                        {
                            chapter_verses.insert(
                                0,
                                vec![OpenVerse {
                                    start_block: chapter.start_block,
                                    start_item: chapter.start_item,
                                    next_token: chapter.next_token,
                                    end: Some((block_n as u32, item_n.saturating_sub(1))),
                                    verses: Some(String::from("0")),
                                }],
                            );
                        }

                        chapter_verses.entry(verse_n).or_default().push(OpenVerse {
                            start_block: block_n as u32,
                            start_item: item_n,
                            next_token,
                            end: None,
                            verses: None,
                        });
                    } else if let Some(rest) = label.strip_prefix("verses/") {
                        verses = rest.to_string();
                    }
                }
                ItemType::EndScope => {
                    let label = read::decode_scope_label(enums, content, pos, subtype)?;
                    if let Some(rest) = label.strip_prefix("chapter/") {
                        // The start may have been filtered out of an edit.
                        if let Some(chapter) = chapter_indexes.get_mut(rest) {
                            chapter.end = Some((block_n as u32, item_n));
                        } else {
                            warn!(label = %label, "chapter end with no open start, skipped");
                        }
                    } else if let Some(rest) = label.strip_prefix("verse/") {
                        let occurrence = leading_digits(rest)
                            .and_then(|verse_n| {
                                chapter_verse_indexes
                                    .get_mut(&chapter_n)
                                    .and_then(|cv| cv.get_mut(&verse_n))
                            })
                            .and_then(|occurrences| occurrences.last_mut());
                        match occurrence {
                            Some(verse) => {
                                verse.end = Some((block_n as u32, item_n));
                                verse.verses = Some(verses.clone());
                            }
                            None => {
                                warn!(label = %label, "verse end with no open start, skipped");
                            }
                        }
                    }
                }
                ItemType::Token => {
                    if format::token_type(subtype, pos)? == TokenType::WordLike {
                        tokens_present.set(format::token_index(content, pos)? as usize);
                        next_token += 1;
                    }
                }
                ItemType::Graft => {}
            }
            pos += record_len;
            item_n += 1;
        }
    }

    // Pack per-chapter verse records.
    sequence.chapter_verses.clear();
    for (chapter, chapter_verses) in &chapter_verse_indexes {
        let mut ba = ByteArray::new();
        if let Some(max_verse) = chapter_verses.keys().next_back().copied() {
            for slot in 0..=max_verse {
                match chapter_verses.get(&slot) {
                    Some(occurrences) => {
                        let complete: Vec<(&OpenVerse, (u32, u32))> = occurrences
                            .iter()
                            .filter_map(|v| match v.end {
                                Some(end) => Some((v, end)),
                                None => {
                                    warn!(chapter = %chapter, verse = slot, "verse never closed, dropped from index");
                                    None
                                }
                            })
                            .collect();
                        if complete.is_empty() {
                            cv_record::push_empty(&mut ba)?;
                            continue;
                        }
                        let last = complete.len() - 1;
                        for (i, (verse, (end_block, end_item))) in complete.iter().enumerate() {
                            let verses_value = verse.verses.as_deref().unwrap_or("1");
                            let verses_index =
                                enums.index_of(EnumCategory::ScopeBits, verses_value)?;
                            cv_record::push_record(
                                &mut ba,
                                &CvRecord {
                                    start_block: verse.start_block,
                                    end_block: *end_block,
                                    start_item: verse.start_item,
                                    end_item: *end_item,
                                    next_token: verse.next_token,
                                    verses_index: Some(verses_index),
                                },
                                i == last,
                            )?;
                        }
                    }
                    None => cv_record::push_empty(&mut ba)?,
                }
            }
        }
        ba.trim();
        sequence.chapter_verses.insert(chapter.clone(), ba);
    }

    // Pack chapter records. Chapters without a seen end are left out.
    sequence.chapters.clear();
    for (chapter, record) in &chapter_indexes {
        let Some((end_block, end_item)) = record.end else {
            continue;
        };
        let mut ba = ByteArray::new();
        cv_record::push_record(
            &mut ba,
            &CvRecord {
                start_block: record.start_block,
                end_block,
                start_item: record.start_item,
                end_item,
                next_token: record.next_token,
                verses_index: None,
            },
            true,
        )?;
        ba.trim();
        sequence.chapters.insert(chapter.clone(), ba);
    }

    sequence.tokens_present = Some(tokens_present);
    tracing::debug!(
        chapters = sequence.chapters.len(),
        word_tokens = next_token,
        "chapter/verse index built"
    );
    Ok(())
}

// ----------------------------------------------------------------------------
// Readers
// ----------------------------------------------------------------------------

/// A decoded chapter span, or one verse occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvIndexEntry {
    pub start_block: u32,
    pub end_block: u32,
    pub start_item: u32,
    pub end_item: u32,
    pub next_token: u32,
    /// The verses-range label ("1", "3-4", …); empty on chapter entries.
    pub verses: String,
}

/// Look up one chapter's span. `Ok(None)` when the chapter is unknown.
pub fn chapter_index(sequence: &Sequence, chapter: &str) -> Result<Option<CvIndexEntry>> {
    let Some(ba) = sequence.chapters.get(chapter) else {
        return Ok(None);
    };
    let (record, _, _) = cv_record::read_record(ba, 0, false)?;
    Ok(record.map(|r| CvIndexEntry {
        start_block: r.start_block,
        end_block: r.end_block,
        start_item: r.start_item,
        end_item: r.end_item,
        next_token: r.next_token,
        verses: String::new(),
    }))
}

/// Decode one chapter's verse index: entry `n` of the result holds every
/// occurrence of verse `n` (empty for unused verse numbers).
pub fn chapter_verse_index(
    sequence: &Sequence,
    enums: &EnumSet,
    chapter: &str,
) -> Result<Vec<Vec<CvIndexEntry>>> {
    let mut verses: Vec<Vec<CvIndexEntry>> = Vec::new();
    let Some(ba) = sequence.chapter_verses.get(chapter) else {
        return Ok(verses);
    };

    let mut current: Vec<CvIndexEntry> = Vec::new();
    let mut pos = 0;
    while pos < ba.len() {
        let (record, is_last, record_len) = cv_record::read_record(ba, pos, true)?;
        if let Some(r) = record {
            let verses_index = r.verses_index.ok_or(SuccinctError::BadRecordHeader {
                offset: pos,
                length: record_len,
            })?;
            current.push(CvIndexEntry {
                start_block: r.start_block,
                end_block: r.end_block,
                start_item: r.start_item,
                end_item: r.end_item,
                next_token: r.next_token,
                verses: enums.value_of(EnumCategory::ScopeBits, verses_index)?.to_string(),
            });
        }
        if is_last {
            verses.push(std::mem::take(&mut current));
        }
        pos += record_len;
    }
    Ok(verses)
}

/// All chapter spans, keyed by chapter number.
pub fn chapter_indexes(sequence: &Sequence) -> Result<FxHashMap<String, CvIndexEntry>> {
    let mut indexes = FxHashMap::default();
    for chapter in sequence.chapters.keys() {
        if let Some(entry) = chapter_index(sequence, chapter)? {
            indexes.insert(chapter.clone(), entry);
        }
    }
    Ok(indexes)
}

/// All verse indexes, keyed by chapter number.
pub fn chapter_verse_indexes(
    sequence: &Sequence,
    enums: &EnumSet,
) -> Result<FxHashMap<String, Vec<Vec<CvIndexEntry>>>> {
    let mut indexes = FxHashMap::default();
    for chapter in sequence.chapter_verses.keys() {
        indexes.insert(
            chapter.clone(),
            chapter_verse_index(sequence, enums, chapter)?,
        );
    }
    Ok(indexes)
}
