use std::fmt;

use crate::block::{Block, SealStatus};

/// Result of chain validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub block_count: u64,
    /// Every block carries a seal that re-derives and meets its difficulty.
    pub seals_valid: bool,
    /// Indices run 0, 1, 2, … and every block points at its predecessor's seal.
    pub linkage_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending block in the chain.
    pub position: usize,
    /// The index the block claims.
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    Unsealed,
    SealMismatch,
    TargetMissed,
    IndexGap,
    BrokenLink,
    GenesisMalformed,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsealed => "unsealed",
            Self::SealMismatch => "seal-mismatch",
            Self::TargetMissed => "target-missed",
            Self::IndexGap => "index-gap",
            Self::BrokenLink => "broken-link",
            Self::GenesisMalformed => "genesis-malformed",
        };
        f.write_str(name)
    }
}

/// Whole-chain integrity validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Check every block's seal, index continuity, previous-hash linkage and
    /// the shape of the genesis block. All violations are collected.
    pub fn validate(blocks: &[Block]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut seals_valid = true;
        let mut linkage_valid = true;

        for (position, block) in blocks.iter().enumerate() {
            let mut report = |kind: ViolationKind, description: String| {
                violations.push(Violation {
                    position,
                    index: block.index(),
                    kind,
                    description,
                });
            };

            let seal = match block.seal_status() {
                SealStatus::Valid => None,
                SealStatus::Unsealed => Some((ViolationKind::Unsealed, "block has no seal".into())),
                SealStatus::Mismatch => Some((
                    ViolationKind::SealMismatch,
                    "stored hash does not match the recomputed seal".into(),
                )),
                SealStatus::TargetMissed => Some((
                    ViolationKind::TargetMissed,
                    format!("seal does not meet difficulty {}", block.difficulty()),
                )),
            };
            if let Some((kind, description)) = seal {
                seals_valid = false;
                report(kind, description);
            }

            let expected_index = position as u64;
            if block.index() != expected_index {
                linkage_valid = false;
                report(
                    ViolationKind::IndexGap,
                    format!("expected index {expected_index}, got {}", block.index()),
                );
            }

            if position == 0 {
                if block.previous_hash().is_some() || !block.patch().is_empty() {
                    linkage_valid = false;
                    report(
                        ViolationKind::GenesisMalformed,
                        "genesis must have an empty patch and no previous hash".into(),
                    );
                }
                continue;
            }

            let expected_prev = blocks[position - 1].hashresult();
            if expected_prev.is_none() || block.previous_hash() != expected_prev {
                linkage_valid = false;
                report(
                    ViolationKind::BrokenLink,
                    "previous hash does not match the preceding seal".into(),
                );
            }
        }

        ValidationReport {
            block_count: blocks.len() as u64,
            seals_valid,
            linkage_valid,
            violations,
        }
    }
}
