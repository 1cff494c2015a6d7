//! Person — anyone who plays, constructs, edits, or hosts.
//!
//! A person's roles are never stored. They are derived from the tables that
//! reference the person (see [`PersonRoles`]).

use serde::{Deserialize, Serialize};

pub type PersonId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:              PersonId,
  pub full_name:              String,
  pub nicknames:              Option<String>,
  pub home_page_url:          Option<String>,
  /// Reference to an externally hosted image.
  pub media_id:               Option<i64>,
  pub xwordinfo_profile_name: Option<String>,
  pub xwordinfo_image_url:    Option<String>,
}

/// Input to [`crate::store::KealoaStore::create_person`] and
/// [`crate::store::KealoaStore::update_person`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPerson {
  pub full_name:              String,
  pub nicknames:              Option<String>,
  pub home_page_url:          Option<String>,
  pub media_id:               Option<i64>,
  pub xwordinfo_profile_name: Option<String>,
  pub xwordinfo_image_url:    Option<String>,
}

impl NewPerson {
  /// A person with only a name; every other field is empty.
  pub fn named(full_name: impl Into<String>) -> Self {
    Self { full_name: full_name.into(), ..Self::default() }
  }
}

/// The roles a person holds, computed from usage at query time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRoles {
  /// Assigned as a guesser to at least one round.
  pub player:      bool,
  /// Listed as a constructor on at least one puzzle.
  pub constructor: bool,
  pub editor:      bool,
  pub clue_giver:  bool,
}

impl PersonRoles {
  pub fn is_empty(&self) -> bool {
    !(self.player || self.constructor || self.editor || self.clue_giver)
  }
}
