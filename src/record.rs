// 💹 Price Record - one named value plus its staged transforms
//
// The committed node is never touched by staging. The current value is
// always recomputed as fold(pending, original), so revert is just a
// truncation of the chain.

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};
use std::sync::Arc;
use tracing::debug;

use crate::config::DocumentConfig;
use crate::diff::{compare, Comparison};
use crate::document::Node;
use crate::error::{PriceDataError, Result};
use crate::transform::{read_value, ShiftMethod, Transform};

// ============================================================================
// PERSISTENCE CALLBACK
// ============================================================================

/// Whole-document persistence, implemented by whoever owns the document.
///
/// Records call this on save instead of holding a reference to their
/// collection. `committed` carries the post-fold nodes by record name; the
/// implementor must write the entire document, not just those nodes.
pub trait Persist {
    fn persist(&mut self, committed: &[(&str, &Node)]) -> Result<()>;
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Serializable view of a record for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSnapshot {
    pub name: String,
    pub original: String,
    pub current: String,
    pub pending: Vec<Transform>,
}

// ============================================================================
// PRICE RECORD
// ============================================================================

#[derive(Debug, Clone)]
pub struct PriceRecord {
    name: String,
    original: Node,
    pending: Vec<Transform>,
    config: Arc<DocumentConfig>,
}

impl PriceRecord {
    pub fn new(name: impl Into<String>, original: Node, config: Arc<DocumentConfig>) -> Self {
        PriceRecord {
            name: name.into(),
            original,
            pending: Vec::new(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last committed node
    pub fn original(&self) -> &Node {
        &self.original
    }

    /// Staged transforms, oldest first
    pub fn pending(&self) -> &[Transform] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // ------------------------------------------------------------------------
    // values
    // ------------------------------------------------------------------------

    /// Apply the staged chain, in order, to a copy of the committed node.
    pub fn current_value(&self) -> Result<Node> {
        let mut node = self.original.clone();
        for transform in &self.pending {
            transform.apply(&self.name, &mut node, &self.config)?;
        }
        Ok(node)
    }

    pub fn current_numeric(&self) -> Result<f64> {
        read_value(&self.name, &self.current_value()?, &self.config)
    }

    pub fn original_numeric(&self) -> Result<f64> {
        read_value(&self.name, &self.original, &self.config)
    }

    // ------------------------------------------------------------------------
    // staging
    // ------------------------------------------------------------------------

    pub(crate) fn stage(&mut self, transform: Transform) -> &mut Self {
        debug!(record = %self.name, transform = %transform, "staged transform");
        self.pending.push(transform);
        self
    }

    /// value := value + delta
    pub fn stage_absolute_shift(&mut self, delta: f64) -> &mut Self {
        self.stage(Transform::AbsoluteShift { delta })
    }

    /// value := value * (1 + rate)
    pub fn stage_relative_shift(&mut self, rate: f64) -> &mut Self {
        self.stage(Transform::RelativeShift { rate })
    }

    /// value := value * exp(rate), on top of everything staged before it
    pub fn stage_log_shift(&mut self, rate: f64) -> &mut Self {
        self.stage(Transform::LogShift { rate })
    }

    /// Overwrite the value, and the kind label when the node has one.
    ///
    /// `kind` defaults to the configured kind (`PX_LAST`).
    pub fn stage_set(&mut self, value: f64, kind: Option<&str>) -> Result<&mut Self> {
        let kind = kind.unwrap_or(&self.config.default_kind).trim().to_string();
        if kind.is_empty() {
            return Err(PriceDataError::InvalidArgument(format!(
                "empty kind label for price record {}",
                self.name
            )));
        }
        Ok(self.stage(Transform::SetValue { value, kind }))
    }

    /// Dispatch on `method` ("w…", "r…", "l…"). Nothing is staged on error.
    pub fn stage_shift(&mut self, amount: f64, method: &str) -> Result<&mut Self> {
        let method: ShiftMethod = method.parse()?;
        Ok(self.stage(Transform::shift(amount, method)))
    }

    // ------------------------------------------------------------------------
    // revert / save
    // ------------------------------------------------------------------------

    /// Drop up to `count` of the most recently staged transforms.
    pub fn revert(&mut self, count: usize) -> &mut Self {
        let keep = self.pending.len().saturating_sub(count);
        if keep < self.pending.len() {
            debug!(
                record = %self.name,
                dropped = self.pending.len() - keep,
                "reverted staged transforms"
            );
        }
        self.pending.truncate(keep);
        self
    }

    pub fn revert_all(&mut self) -> &mut Self {
        self.revert(self.pending.len())
    }

    /// Install an already-folded node as the committed value and clear the
    /// chain. Callers fold first and persist before committing.
    pub(crate) fn commit(&mut self, folded: Node) {
        self.original = folded;
        self.pending.clear();
    }

    /// Fold the chain into the committed value and persist through `owner`.
    ///
    /// The owner sees the post-fold node. If folding or persisting fails the
    /// record keeps its committed value and its chain.
    pub fn save<P: Persist + ?Sized>(&mut self, owner: &mut P) -> Result<()> {
        let folded = self.current_value()?;
        owner.persist(&[(self.name.as_str(), &folded)])?;
        self.commit(folded);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // display
    // ------------------------------------------------------------------------

    /// Committed line vs. current line.
    pub fn comparison(&self) -> Result<Comparison> {
        Ok(compare(
            &self.original.render(),
            &self.current_value()?.render(),
        ))
    }

    /// Write the diff of pending changes to `out`.
    pub fn describe<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let comparison = self.comparison()?;
        write!(out, "{}", comparison).map_err(|e| PriceDataError::io("<output>", e))
    }

    /// Write the current line to `out`.
    pub fn show<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let current = self.current_value()?;
        writeln!(out, "{}", current.render()).map_err(|e| PriceDataError::io("<output>", e))
    }

    pub fn snapshot(&self) -> Result<RecordSnapshot> {
        Ok(RecordSnapshot {
            name: self.name.clone(),
            original: self.original.render(),
            current: self.current_value()?.render(),
            pending: self.pending.clone(),
        })
    }
}

impl fmt::Display for PriceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// COMPOUND ASSIGNMENT
// ============================================================================

impl AddAssign<f64> for PriceRecord {
    fn add_assign(&mut self, delta: f64) {
        self.stage_absolute_shift(delta);
    }
}

impl SubAssign<f64> for PriceRecord {
    fn sub_assign(&mut self, delta: f64) {
        self.stage_absolute_shift(-delta);
    }
}

impl MulAssign<f64> for PriceRecord {
    fn mul_assign(&mut self, factor: f64) {
        self.stage_relative_shift(factor - 1.0);
    }
}

impl DivAssign<f64> for PriceRecord {
    fn div_assign(&mut self, factor: f64) {
        self.stage_relative_shift(1.0 / factor - 1.0);
    }
}
