//! Sequence alignment of sibling nodes.
//!
//! A classic O(nm) edit distance where substituting one element for
//! another costs in proportion to how different they are, so a sibling
//! inserted in the middle of a list shows up as one `UniqueY` instead of
//! every later element turning into `Modified`.

/// How alike two elements are, counted over their leaves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Similarity {
    pub same: usize,
    pub different: usize,
}

impl Similarity {
    pub fn identical(&self) -> bool {
        self.different == 0
    }
}

impl std::ops::Add for Similarity {
    type Output = Similarity;
    fn add(self, rhs: Similarity) -> Similarity {
        Similarity {
            same: self.same + rhs.same,
            different: self.different + rhs.different,
        }
    }
}

impl std::ops::AddAssign for Similarity {
    fn add_assign(&mut self, rhs: Similarity) {
        *self = *self + rhs;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EditOp {
    /// x[i] and y[j] are equal
    Identity,
    /// x[i] became y[j]
    Modified,
    /// x[i] was deleted
    UniqueX,
    /// y[j] was inserted
    UniqueY,
}

// integer costs, scaled so a modification is never dearer than a
// deletion plus an insertion
const SCALE: usize = 100;
const UNIQUE: usize = SCALE;

pub struct Aligner {
    /// modifications at least this different are scored as delete + insert
    pub max_modified_cost: usize,
}

impl Default for Aligner {
    fn default() -> Self {
        Self {
            max_modified_cost: 2 * UNIQUE,
        }
    }
}

impl Aligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit script turning a sequence of `n` elements into one of `m`.
    /// `similarity(i, j)` compares `x[i]` with `y[j]`.
    pub fn align<F>(&self, n: usize, m: usize, mut similarity: F) -> Vec<EditOp>
    where
        F: FnMut(usize, usize) -> Similarity,
    {
        let width = m + 1;
        let mut cost = vec![0usize; (n + 1) * width];
        let mut step = vec![EditOp::Identity; (n + 1) * width];
        for i in 1..=n {
            cost[i * width] = i * UNIQUE;
            step[i * width] = EditOp::UniqueX;
        }
        for j in 1..=m {
            cost[j] = j * UNIQUE;
            step[j] = EditOp::UniqueY;
        }
        for i in 1..=n {
            for j in 1..=m {
                let sim = similarity(i - 1, j - 1);
                let diag = if sim.identical() {
                    Some((0, EditOp::Identity))
                } else {
                    let c = self.modified_cost(sim);
                    if c < self.max_modified_cost {
                        Some((c, EditOp::Modified))
                    } else {
                        None
                    }
                };
                // on a tie the deletion comes first in the script
                let mut best = (cost[i * width + j - 1] + UNIQUE, EditOp::UniqueY);
                let del = (cost[(i - 1) * width + j] + UNIQUE, EditOp::UniqueX);
                if del.0 < best.0 {
                    best = del;
                }
                if let Some((c, op)) = diag {
                    let diag = cost[(i - 1) * width + j - 1] + c;
                    if diag <= best.0 {
                        best = (diag, op);
                    }
                }
                cost[i * width + j] = best.0;
                step[i * width + j] = best.1;
            }
        }
        let mut script = Vec::with_capacity(n.max(m));
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            let op = step[i * width + j];
            script.push(op);
            match op {
                EditOp::Identity | EditOp::Modified => {
                    i -= 1;
                    j -= 1;
                }
                EditOp::UniqueX => i -= 1,
                EditOp::UniqueY => j -= 1,
            }
        }
        script.reverse();
        script
    }

    fn modified_cost(&self, sim: Similarity) -> usize {
        let total = sim.same + sim.different;
        if total == 0 {
            return 0;
        }
        2 * UNIQUE * sim.different / total
    }
}

#[cfg(test)]
mod test {
    use super::EditOp::*;
    use super::*;

    fn script(x: &[&str], y: &[&str]) -> Vec<EditOp> {
        Aligner::new().align(x.len(), y.len(), |i, j| {
            // compare character by character
            let (a, b) = (x[i].as_bytes(), y[j].as_bytes());
            let same = a.iter().zip(b).filter(|(p, q)| p == q).count();
            let different = a.len().max(b.len()) - same;
            Similarity { same, different }
        })
    }

    #[test]
    fn test_identity() {
        assert_eq!(script(&["a", "b"], &["a", "b"]), vec![Identity, Identity]);
        assert_eq!(script(&[], &[]), vec![]);
    }

    #[test]
    fn test_insertion() {
        assert_eq!(
            script(&["foo", "bar"], &["foo", "new", "bar"]),
            vec![Identity, UniqueY, Identity]
        );
        assert_eq!(script(&[], &["x"]), vec![UniqueY]);
    }

    #[test]
    fn test_deletion() {
        assert_eq!(
            script(&["foo", "zzz", "bar"], &["foo", "bar"]),
            vec![Identity, UniqueX, Identity]
        );
    }

    #[test]
    fn test_modification() {
        assert_eq!(
            script(&["foo(1)", "bar"], &["foo(2)", "bar"]),
            vec![Modified, Identity]
        );
        // nothing in common: delete and insert
        assert_eq!(script(&["abc"], &["xyz"]), vec![UniqueX, UniqueY]);
    }
}
