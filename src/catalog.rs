use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::{Level, span, debug, warn};

use super::error::RecommendError;

/// Sentinel for absent categorical fields.
pub const UNKNOWN: &str = "unknown";
const NO_DESCRIPTION: &str = "no description available";
const NO_SYNONYMS: &str = "no synonyms";

/// One row of the tabular catalog source, before any defaulting.
///
/// Field names follow the Top Anime dataset headers; every field is optional
/// so that a sparse source can still be deserialized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawItem {
  #[serde(rename = "English", default)]
  pub title: Option<String>,
  #[serde(rename = "Genres", default)]
  pub genres: Option<String>,
  #[serde(rename = "Type", default)]
  pub kind: Option<String>,
  #[serde(rename = "Description", default)]
  pub description: Option<String>,
  #[serde(rename = "Score", default)]
  pub score: Option<f32>,
  #[serde(rename = "Demographic", default)]
  pub demographic: Option<String>,
  #[serde(rename = "Source", default)]
  pub source: Option<String>,
  #[serde(rename = "Synonyms", default)]
  pub synonyms: Option<String>,
  #[serde(rename = "Broadcast", default)]
  pub broadcast: Option<String>,
}

/// A normalized catalog entry. Every textual field is populated, either from
/// the source row or from a documented sentinel, so downstream vectorization
/// never sees a missing value.
#[derive(Debug, Clone)]
pub struct Item {
  /// Position in the catalog; row index of every derived artifact.
  pub index: usize,
  /// External lookup key. Empty when the source row had no title; such
  /// items can be recommended but not queried.
  pub title: String,
  /// Lowercased, trimmed, de-duplicated genre labels. Never empty: rows
  /// without genre data carry the `unknown` sentinel.
  pub genres: Vec<String>,
  pub kind: String,
  pub description: String,
  pub score: Option<f32>,
  pub demographic: String,
  pub source: String,
  pub synonyms: String,
  pub broadcast: String,
  /// Concatenated lowercase genres, type and description.
  pub content_features: String,
}

impl Item {
  fn normalize(index: usize, raw: RawItem) -> Self {
    let genres_raw = or_sentinel(raw.genres, UNKNOWN);
    let kind = or_sentinel(raw.kind, UNKNOWN);
    let description = or_sentinel(raw.description, NO_DESCRIPTION);
    let content_features = format!(
      "{} {} {}",
      genres_raw.to_lowercase(),
      kind.to_lowercase(),
      description.to_lowercase()
    );
    Self {
      index,
      title: raw.title.unwrap_or_default(),
      genres: parse_genres(&genres_raw),
      kind,
      description,
      score: raw.score,
      demographic: or_sentinel(raw.demographic, UNKNOWN),
      source: or_sentinel(raw.source, UNKNOWN),
      synonyms: or_sentinel(raw.synonyms, NO_SYNONYMS),
      broadcast: or_sentinel(raw.broadcast, UNKNOWN),
      content_features,
    }
  }

  /// Whether the genre-set carries usable relevance information.
  pub fn has_genre_signal(&self) -> bool {
    !(self.genres.is_empty()
      || (self.genres.len() == 1 && self.genres[0] == UNKNOWN))
  }
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
  match value {
    Some(v) if !v.trim().is_empty() => v,
    _ => sentinel.to_string(),
  }
}

/// Splits a comma-separated genre string into lowercase trimmed labels,
/// dropping duplicates. Unparseable or empty input degrades to the
/// `unknown` sentinel rather than failing.
pub fn parse_genres(raw: &str) -> Vec<String> {
  let mut genres: Vec<String> = Vec::new();
  for label in raw.split(',') {
    let label = label.trim().to_lowercase();
    if !label.is_empty() && !genres.contains(&label) {
      genres.push(label);
    }
  }
  if genres.is_empty() {
    genres.push(UNKNOWN.to_string());
  }
  genres
}

/// Immutable, ordered corpus of normalized items.
///
/// Item order is referential: a fitted vectorizer and similarity matrix are
/// only valid against the exact catalog they were built from.
#[derive(Debug)]
pub struct Catalog {
  items: Vec<Item>,
  title_index: HashMap<String, usize>,
  duplicates: Vec<String>,
}

impl Catalog {
  /// Normalizes raw rows into a catalog. Exact duplicate rows are dropped;
  /// rows that share a title with an earlier row are kept but recorded as
  /// ambiguous, with the earlier row winning title lookups.
  pub fn from_raw(raw: Vec<RawItem>) -> Self {
    let span = span!(Level::DEBUG, "catalog-load");
    let _guard = span.enter();
    let mut rows: Vec<RawItem> = Vec::with_capacity(raw.len());
    for row in raw {
      if !rows.contains(&row) {
        rows.push(row);
      }
    }
    debug!("Normalizing {} catalog rows", rows.len());
    let items: Vec<Item> = rows.into_iter()
      .enumerate()
      .map(|(index, row)| Item::normalize(index, row))
      .collect();
    let mut title_index = HashMap::with_capacity(items.len());
    let mut duplicates = Vec::new();
    for item in &items {
      if item.title.is_empty() {
        continue;
      }
      if title_index.contains_key(&item.title) {
        if !duplicates.contains(&item.title) {
          duplicates.push(item.title.clone());
        }
      } else {
        title_index.insert(item.title.clone(), item.index);
      }
    }
    if !duplicates.is_empty() {
      warn!("Catalog contains {} ambiguous titles; first occurrence wins", duplicates.len());
    }
    Self { items, title_index, duplicates }
  }

  pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecommendError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let raw = csv_reader.deserialize()
      .collect::<Result<Vec<RawItem>, csv::Error>>()?;
    Ok(Self::from_raw(raw))
  }

  pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, RecommendError> {
    let file = File::open(path)?;
    Self::from_reader(BufReader::new(file))
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn get(&self, index: usize) -> Option<&Item> {
    self.items.get(index)
  }

  /// Exact title match; on duplicate titles the first item in corpus order
  /// is returned.
  pub fn find_by_title(&self, title: &str) -> Option<&Item> {
    self.index_of_title(title).and_then(|index| self.items.get(index))
  }

  pub fn index_of_title(&self, title: &str) -> Option<usize> {
    self.title_index.get(title).copied()
  }

  /// Titles shared by more than one catalog entry, surfaced so a consumer
  /// can decide whether first-match lookup is acceptable.
  pub fn duplicate_titles(&self) -> &[String] {
    &self.duplicates
  }

  pub fn content_features(&self) -> Vec<&str> {
    self.items.iter().map(|item| item.content_features.as_str()).collect()
  }
}
