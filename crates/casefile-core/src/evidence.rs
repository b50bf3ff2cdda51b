//! Evidence snapshots: immutable captures of a target account.
//!
//! A snapshot is produced by the external evidence collector and appended to
//! the case's evidence log. Snapshots are never edited; a correction is a new
//! snapshot. Field declaration order below is part of the canonical encoding
//! hashed by [`crate::integrity`], so reordering fields changes every hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile fields as seen at collection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub display_name:      String,
  pub bio:               String,
  pub location:          Option<String>,
  pub verified:          bool,
  #[serde(default)]
  pub profile_image_url: Option<String>,
}

/// Account-level counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountMetadata {
  pub total_posts:      u64,
  pub followers:        u64,
  pub following:        u64,
  pub account_age_days: u64,
}

/// A single post captured with its engagement counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  /// Platform-assigned identifier, when the collector exposes one.
  #[serde(default)]
  pub post_id:   Option<String>,
  pub content:   String,
  pub likes:     u64,
  pub comments:  u64,
  pub shares:    u64,
  #[serde(with = "crate::timestamp")]
  pub timestamp: DateTime<Utc>,
  #[serde(default)]
  pub hashtags:  Vec<String>,
}

/// One immutable capture of collected profile and post data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
  #[serde(with = "crate::timestamp")]
  pub scraped_at: DateTime<Utc>,
  pub profile:    Profile,
  pub metadata:   AccountMetadata,
  pub posts:      Vec<Post>,
}

impl EvidenceSnapshot {
  /// Bring every timestamp to the canonical precision.
  ///
  /// Applied once on intake so the in-memory value, the stored value and the
  /// hashed value all agree.
  pub fn normalized(mut self) -> Self {
    self.scraped_at = crate::timestamp::normalize(self.scraped_at);
    for post in &mut self.posts {
      post.timestamp = crate::timestamp::normalize(post.timestamp);
    }
    self
  }
}

/// A snapshot together with its position in the case's evidence log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
  /// Zero-based collection order; gap-free per case.
  pub sequence: u32,
  pub snapshot: EvidenceSnapshot,
}
