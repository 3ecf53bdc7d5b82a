//! Human-readable system identifiers.
//!
//! Every student, family, group class and school carries a short identifier
//! such as `STU-00042` or `FAM-K7QX2`. Identifiers are produced here and
//! reserved through a [`SystemIdStore`], whose implementation is expected to
//! enforce uniqueness at the database level. Losing a race to a concurrent
//! request is handled by retrying with a fresh candidate, up to a bounded
//! number of attempts, after which a timestamp-based fallback is used.
//!
//! | Kind    | Prefix | Suffix | Strategy   | Example      |
//! |---------|--------|--------|------------|--------------|
//! | Student | `STU`  | 5      | sequential | `STU-00042`  |
//! | Family  | `FAM`  | 5      | random     | `FAM-K7QX2`  |
//! | Group   | `GRO`  | 6      | random     | `GRO-M3ZP9A` |
//! | School  | `SCH`  | 6      | sequential | `SCH-000007` |

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use axum::http::StatusCode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Characters used for random suffixes. `0 O 1 I L` are excluded.
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const FALLBACK_RANDOM_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum SystemIdError {
    #[error("Malformed system id: {0}")]
    Malformed(String),

    #[error("Could not allocate a unique {kind} system id after {attempts} attempts")]
    Exhausted { kind: SystemIdKind, attempts: u32 },

    #[error("System id store failure: {0}")]
    Store(anyhow::Error),
}

impl SystemIdError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Store(err.into())
    }

    /// HTTP status a handler should answer with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Exhausted { .. } | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixStrategy {
    /// Zero padded counter continuing from the highest issued value.
    Sequential,
    /// Characters drawn from [`SUFFIX_ALPHABET`].
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SystemIdKind {
    Student,
    Family,
    Group,
    School,
}

impl SystemIdKind {
    pub const ALL: [SystemIdKind; 4] = [Self::Student, Self::Family, Self::Group, Self::School];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Student => "STU",
            Self::Family => "FAM",
            Self::Group => "GRO",
            Self::School => "SCH",
        }
    }

    pub fn suffix_len(self) -> usize {
        match self {
            Self::Student | Self::Family => 5,
            Self::Group | Self::School => 6,
        }
    }

    pub fn strategy(self) -> SuffixStrategy {
        match self {
            Self::Student | Self::School => SuffixStrategy::Sequential,
            Self::Family | Self::Group => SuffixStrategy::Random,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Family => "family",
            Self::Group => "group",
            Self::School => "school",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    /// Recognise the kind of an identifier in either the primary or the
    /// fallback format. Returns `None` for anything else.
    pub fn classify(value: &str) -> Option<Self> {
        Self::parse(value).ok()
    }

    pub fn parse(value: &str) -> Result<Self, SystemIdError> {
        let malformed = || SystemIdError::Malformed(value.to_string());
        let (prefix, suffix) = value.split_once('-').ok_or_else(malformed)?;
        let kind = Self::from_prefix(prefix).ok_or_else(malformed)?;

        let valid_suffix = suffix.len() >= kind.suffix_len()
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase());
        if valid_suffix {
            Ok(kind)
        } else {
            Err(malformed())
        }
    }

    /// Largest counter value that fits the suffix width.
    pub fn max_sequence(self) -> u64 {
        10u64.pow(self.suffix_len() as u32) - 1
    }

    /// Format a sequential identifier, or `None` when the counter overflows.
    pub fn format_sequence(self, sequence: u64) -> Option<String> {
        if sequence == 0 || sequence > self.max_sequence() {
            return None;
        }
        Some(format!(
            "{}-{:0width$}",
            self.prefix(),
            sequence,
            width = self.suffix_len()
        ))
    }

    /// Counter of a sequential identifier in the primary format.
    pub fn sequence_of(self, value: &str) -> Option<u64> {
        let suffix = value.strip_prefix(self.prefix())?.strip_prefix('-')?;
        if suffix.len() != self.suffix_len() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse().ok()
    }
}

impl fmt::Display for SystemIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemIdKind {
    type Err = SystemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SystemIdError::Malformed(s.to_string()))
    }
}

/// The entity an identifier is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemIdOwner {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
}

impl SystemIdOwner {
    pub fn new(entity_type: &'static str, entity_id: Uuid) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

/// Backing registry of issued identifiers.
pub trait SystemIdStore: Send {
    fn exists(&mut self, value: &str) -> impl Future<Output = Result<bool, SystemIdError>> + Send;

    /// Highest counter issued so far for a sequential kind.
    fn highest_sequence(
        &mut self,
        kind: SystemIdKind,
    ) -> impl Future<Output = Result<Option<u64>, SystemIdError>> + Send;

    /// Atomically reserve `value`. Returns `false` when it is already taken.
    fn try_reserve(
        &mut self,
        kind: SystemIdKind,
        value: &str,
        owner: SystemIdOwner,
    ) -> impl Future<Output = Result<bool, SystemIdError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedId {
    pub value: String,
    /// Number of candidates tried, including the accepted one.
    pub attempts: u32,
    pub fallback: bool,
}

impl GeneratedId {
    /// Candidates rejected before this one was accepted.
    pub fn collisions(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

#[derive(Clone, Copy)]
enum Acceptance {
    Vacant,
    Reserve(SystemIdOwner),
}

#[derive(Debug, Clone, Copy)]
pub struct SystemIdGenerator {
    max_attempts: u32,
}

impl Default for SystemIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl SystemIdGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Produce a candidate that is not present in the store, without
    /// reserving it.
    pub async fn generate<S: SystemIdStore>(
        &self,
        store: &mut S,
        kind: SystemIdKind,
    ) -> Result<GeneratedId, SystemIdError> {
        self.run(store, kind, Acceptance::Vacant).await
    }

    /// Generate and reserve an identifier for `owner`, retrying when a
    /// concurrent request wins the race for a candidate.
    pub async fn claim<S: SystemIdStore>(
        &self,
        store: &mut S,
        kind: SystemIdKind,
        owner: SystemIdOwner,
    ) -> Result<GeneratedId, SystemIdError> {
        self.run(store, kind, Acceptance::Reserve(owner)).await
    }

    async fn run<S: SystemIdStore>(
        &self,
        store: &mut S,
        kind: SystemIdKind,
        acceptance: Acceptance,
    ) -> Result<GeneratedId, SystemIdError> {
        let mut attempts = 0u32;
        let mut last_rejected: Option<u64> = None;

        while attempts < self.max_attempts {
            let candidate = match kind.strategy() {
                SuffixStrategy::Random => Some(random_candidate(kind)),
                SuffixStrategy::Sequential => {
                    let highest = store.highest_sequence(kind).await?.unwrap_or(0);
                    let next = highest.max(last_rejected.unwrap_or(0)) + 1;
                    last_rejected = Some(next);
                    kind.format_sequence(next)
                }
            };

            let Some(candidate) = candidate else {
                warn!(system_id.kind = %kind, "Sequential system id space exhausted, using fallback");
                break;
            };

            attempts += 1;
            if accept(store, kind, &candidate, acceptance).await? {
                debug!(system_id.kind = %kind, system_id.value = %candidate, attempts, "System id allocated");
                return Ok(GeneratedId {
                    value: candidate,
                    attempts,
                    fallback: false,
                });
            }

            debug!(system_id.kind = %kind, system_id.value = %candidate, attempts, "System id collision");
        }

        warn!(
            system_id.kind = %kind,
            attempts,
            "Primary system id format exhausted, switching to fallback"
        );

        for _ in 0..self.max_attempts {
            let candidate = fallback_candidate(kind);
            attempts += 1;
            if accept(store, kind, &candidate, acceptance).await? {
                return Ok(GeneratedId {
                    value: candidate,
                    attempts,
                    fallback: true,
                });
            }
            debug!(system_id.kind = %kind, system_id.value = %candidate, "Fallback system id collision");
        }

        Err(SystemIdError::Exhausted { kind, attempts })
    }
}

async fn accept<S: SystemIdStore>(
    store: &mut S,
    kind: SystemIdKind,
    candidate: &str,
    acceptance: Acceptance,
) -> Result<bool, SystemIdError> {
    match acceptance {
        Acceptance::Vacant => Ok(!store.exists(candidate).await?),
        Acceptance::Reserve(owner) => store.try_reserve(kind, candidate, owner).await,
    }
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

fn random_candidate(kind: SystemIdKind) -> String {
    format!("{}-{}", kind.prefix(), random_suffix(kind.suffix_len()))
}

/// Encode `value` in base 31 using [`SUFFIX_ALPHABET`].
fn encode_base31(mut value: u64) -> String {
    let base = SUFFIX_ALPHABET.len() as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(SUFFIX_ALPHABET[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// `PREFIX-<base-31 millisecond timestamp><4 random chars>`.
fn fallback_candidate(kind: SystemIdKind) -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!(
        "{}-{}{}",
        kind.prefix(),
        encode_base31(millis),
        random_suffix(FALLBACK_RANDOM_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory registry. `steal_next` simulates concurrent requests
    /// claiming the next N candidates just before this one reserves them.
    #[derive(Default)]
    struct MemoryStore {
        ids: HashMap<String, (SystemIdKind, Option<SystemIdOwner>)>,
        steal_next: u32,
        reserve_calls: u32,
    }

    impl MemoryStore {
        fn with_ids(kind: SystemIdKind, ids: &[&str]) -> Self {
            let mut store = Self::default();
            for id in ids {
                store.ids.insert(id.to_string(), (kind, None));
            }
            store
        }
    }

    impl SystemIdStore for MemoryStore {
        async fn exists(&mut self, value: &str) -> Result<bool, SystemIdError> {
            Ok(self.ids.contains_key(value))
        }

        async fn highest_sequence(
            &mut self,
            kind: SystemIdKind,
        ) -> Result<Option<u64>, SystemIdError> {
            Ok(self
                .ids
                .keys()
                .filter_map(|id| kind.sequence_of(id))
                .max())
        }

        async fn try_reserve(
            &mut self,
            kind: SystemIdKind,
            value: &str,
            owner: SystemIdOwner,
        ) -> Result<bool, SystemIdError> {
            self.reserve_calls += 1;
            if self.steal_next > 0 {
                self.steal_next -= 1;
                self.ids.insert(value.to_string(), (kind, None));
                return Ok(false);
            }
            if self.ids.contains_key(value) {
                return Ok(false);
            }
            self.ids.insert(value.to_string(), (kind, Some(owner)));
            Ok(true)
        }
    }

    fn owner() -> SystemIdOwner {
        SystemIdOwner::new("users", Uuid::new_v4())
    }

    fn uses_alphabet(suffix: &str) -> bool {
        suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        assert_eq!(SUFFIX_ALPHABET.len(), 31);
        for ch in [b'0', b'O', b'1', b'I', b'L'] {
            assert!(!SUFFIX_ALPHABET.contains(&ch));
        }
    }

    #[test]
    fn test_format_sequence_zero_pads() {
        assert_eq!(
            SystemIdKind::Student.format_sequence(42).as_deref(),
            Some("STU-00042")
        );
        assert_eq!(
            SystemIdKind::School.format_sequence(7).as_deref(),
            Some("SCH-000007")
        );
        assert_eq!(SystemIdKind::Student.format_sequence(100_000), None);
        assert_eq!(SystemIdKind::Student.format_sequence(0), None);
    }

    #[test]
    fn test_sequence_of_only_reads_primary_format() {
        assert_eq!(SystemIdKind::Student.sequence_of("STU-00042"), Some(42));
        assert_eq!(SystemIdKind::Student.sequence_of("STU-0042"), None);
        assert_eq!(SystemIdKind::Student.sequence_of("SCH-00042"), None);
        assert_eq!(SystemIdKind::Student.sequence_of("STU-ABCDE"), None);
    }

    #[test]
    fn test_classify_recognises_prefixes() {
        assert_eq!(
            SystemIdKind::classify("STU-00001"),
            Some(SystemIdKind::Student)
        );
        assert_eq!(
            SystemIdKind::classify("FAM-K7QX2"),
            Some(SystemIdKind::Family)
        );
        assert_eq!(
            SystemIdKind::classify("GRO-M3ZP9A"),
            Some(SystemIdKind::Group)
        );
        assert_eq!(
            SystemIdKind::classify("SCH-000007"),
            Some(SystemIdKind::School)
        );
        assert_eq!(SystemIdKind::classify("XYZ-00001"), None);
        assert_eq!(SystemIdKind::classify("STU-12"), None);
        assert_eq!(SystemIdKind::classify("stu-00001"), None);
        assert_eq!(SystemIdKind::classify("STU00001"), None);
    }

    #[test]
    fn test_parse_reports_malformed() {
        let err = SystemIdKind::parse("nope").unwrap_err();
        assert!(matches!(err, SystemIdError::Malformed(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_kind_from_str_round_trips_names() {
        for kind in SystemIdKind::ALL {
            assert_eq!(kind.as_str().parse::<SystemIdKind>().unwrap(), kind);
        }
        assert!("teacher".parse::<SystemIdKind>().is_err());
    }

    #[test]
    fn test_fallback_candidate_is_classified() {
        for kind in SystemIdKind::ALL {
            let candidate = fallback_candidate(kind);
            let suffix = candidate.split_once('-').unwrap().1;
            assert_eq!(suffix.len(), 9 + FALLBACK_RANDOM_LEN);
            assert!(uses_alphabet(suffix));
            assert_eq!(SystemIdKind::classify(&candidate), Some(kind));
        }
    }

    #[test]
    fn test_encode_base31() {
        assert_eq!(encode_base31(0), "A");
        assert_eq!(encode_base31(30), "9");
        assert_eq!(encode_base31(31), "BA");
    }

    #[tokio::test]
    async fn test_sequential_continues_from_highest() {
        let mut store =
            MemoryStore::with_ids(SystemIdKind::Student, &["STU-00001", "STU-00041", "STU-00007"]);
        let generator = SystemIdGenerator::default();

        let id = generator
            .claim(&mut store, SystemIdKind::Student, owner())
            .await
            .unwrap();
        assert_eq!(id.value, "STU-00042");
        assert_eq!(id.attempts, 1);
        assert!(!id.fallback);
    }

    #[tokio::test]
    async fn test_sequential_starts_at_one() {
        let mut store = MemoryStore::default();
        let id = SystemIdGenerator::default()
            .claim(&mut store, SystemIdKind::School, owner())
            .await
            .unwrap();
        assert_eq!(id.value, "SCH-000001");
    }

    #[tokio::test]
    async fn test_random_ids_match_format() {
        let mut store = MemoryStore::default();
        let generator = SystemIdGenerator::default();

        for kind in [SystemIdKind::Family, SystemIdKind::Group] {
            for _ in 0..50 {
                let id = generator.claim(&mut store, kind, owner()).await.unwrap();
                let suffix = id.value.strip_prefix(&format!("{}-", kind.prefix())).unwrap();
                assert_eq!(suffix.len(), kind.suffix_len());
                assert!(uses_alphabet(suffix));
            }
        }
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let mut store = MemoryStore::default();
        let generator = SystemIdGenerator::default();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            let id = generator
                .claim(&mut store, SystemIdKind::Student, owner())
                .await
                .unwrap();
            assert!(seen.insert(id.value));
        }
        for _ in 0..200 {
            let id = generator
                .claim(&mut store, SystemIdKind::Family, owner())
                .await
                .unwrap();
            assert!(seen.insert(id.value));
        }
    }

    #[tokio::test]
    async fn test_lost_race_retries_with_new_candidate() {
        let mut store = MemoryStore::with_ids(SystemIdKind::Student, &["STU-00010"]);
        store.steal_next = 2;

        let id = SystemIdGenerator::default()
            .claim(&mut store, SystemIdKind::Student, owner())
            .await
            .unwrap();

        assert_eq!(id.value, "STU-00013");
        assert_eq!(id.attempts, 3);
        assert_eq!(id.collisions(), 2);
        assert!(!id.fallback);
        assert!(store.ids.contains_key("STU-00011"));
        assert!(store.ids.contains_key("STU-00012"));
    }

    #[tokio::test]
    async fn test_random_collision_yields_different_id() {
        let mut store = MemoryStore::default();
        store.steal_next = 1;

        let id = SystemIdGenerator::default()
            .claim(&mut store, SystemIdKind::Group, owner())
            .await
            .unwrap();

        assert_eq!(id.attempts, 2);
        assert_eq!(store.ids.len(), 2);
        let (_, owned_by) = store.ids[&id.value];
        assert!(owned_by.is_some());
    }

    #[tokio::test]
    async fn test_fallback_after_attempt_bound() {
        let mut store = MemoryStore::default();
        store.steal_next = 3;

        let id = SystemIdGenerator::new(3)
            .claim(&mut store, SystemIdKind::Family, owner())
            .await
            .unwrap();

        assert!(id.fallback);
        assert_eq!(id.attempts, 4);
        assert!(id.value.starts_with("FAM-"));
        assert_eq!(id.value.len(), "FAM-".len() + 9 + FALLBACK_RANDOM_LEN);
        assert_eq!(SystemIdKind::classify(&id.value), Some(SystemIdKind::Family));
        assert_eq!(store.ids.len(), 4);
    }

    #[tokio::test]
    async fn test_sequential_overflow_uses_fallback() {
        let mut store = MemoryStore::with_ids(SystemIdKind::Student, &["STU-99999"]);

        let id = SystemIdGenerator::default()
            .claim(&mut store, SystemIdKind::Student, owner())
            .await
            .unwrap();

        assert!(id.fallback);
        assert_eq!(id.attempts, 1);
        assert_eq!(SystemIdKind::classify(&id.value), Some(SystemIdKind::Student));
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let mut store = MemoryStore::default();
        store.steal_next = u32::MAX;

        let err = SystemIdGenerator::new(2)
            .claim(&mut store, SystemIdKind::Group, owner())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SystemIdError::Exhausted {
                kind: SystemIdKind::Group,
                attempts: 4
            }
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.reserve_calls, 4);
    }

    #[tokio::test]
    async fn test_generate_skips_existing_without_reserving() {
        let mut store = MemoryStore::with_ids(SystemIdKind::School, &["SCH-000003"]);

        let id = SystemIdGenerator::default()
            .generate(&mut store, SystemIdKind::School)
            .await
            .unwrap();

        assert_eq!(id.value, "SCH-000004");
        assert_eq!(store.reserve_calls, 0);
        assert!(!store.ids.contains_key("SCH-000004"));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(SystemIdGenerator::new(0).max_attempts(), 1);
    }
}
