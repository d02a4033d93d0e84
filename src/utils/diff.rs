//! Ordered list diff by identity.
//!
//! Produces the edit script of a longest common subsequence between two
//! lists, so synchronizing one list onto another touches only the elements
//! that actually differ. Common prefixes and suffixes are matched before the
//! quadratic table is built.
//!
//! ```text
//! left:  [1, 2, 3]        Keep(0,0) Remove(1) Keep(2,1) Insert(2)
//! right: [1, 3, 4]
//! ```

/// One step of an edit script, indexes into the original lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// `left[left]` and `right[right]` are the same element
    Keep { left: usize, right: usize },
    /// `left[left]` has no counterpart on the right
    Remove { left: usize },
    /// `right[right]` has no counterpart on the left
    Insert { right: usize },
}

/// Edit script turning `left` into `right`, in list order.
///
/// When dropping a left element and adding a right element are equally good,
/// the removal comes first.
pub fn diff<L, R, F>(
    left: &[L],
    right: &[R],
    same: F,
) -> Vec<DiffOp>
where
    F: Fn(&L, &R) -> bool,
{
    let mut prefix = 0;
    while prefix < left.len() && prefix < right.len() && same(&left[prefix], &right[prefix]) {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < left.len() - prefix
        && suffix < right.len() - prefix
        && same(&left[left.len() - 1 - suffix], &right[right.len() - 1 - suffix])
    {
        suffix += 1;
    }

    let mut ops = Vec::with_capacity(left.len().max(right.len()));
    ops.extend((0..prefix).map(|i| DiffOp::Keep { left: i, right: i }));

    let left_mid = &left[prefix..left.len() - suffix];
    let right_mid = &right[prefix..right.len() - suffix];
    let n = left_mid.len();
    let m = right_mid.len();
    if n == 0 {
        ops.extend((0..m).map(|j| DiffOp::Insert { right: prefix + j }));
    } else if m == 0 {
        ops.extend((0..n).map(|i| DiffOp::Remove { left: prefix + i }));
    } else {
        // lcs[i * (m + 1) + j] = length of the LCS of left_mid[i..] and right_mid[j..]
        let width = m + 1;
        let mut lcs = vec![0u32; (n + 1) * width];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                lcs[i * width + j] = if same(&left_mid[i], &right_mid[j]) {
                    lcs[(i + 1) * width + j + 1] + 1
                } else {
                    lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if same(&left_mid[i], &right_mid[j]) {
                ops.push(DiffOp::Keep {
                    left: prefix + i,
                    right: prefix + j,
                });
                i += 1;
                j += 1;
            } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
                ops.push(DiffOp::Remove { left: prefix + i });
                i += 1;
            } else {
                ops.push(DiffOp::Insert { right: prefix + j });
                j += 1;
            }
        }
        ops.extend((i..n).map(|i| DiffOp::Remove { left: prefix + i }));
        ops.extend((j..m).map(|j| DiffOp::Insert { right: prefix + j }));
    }

    let left_tail = left.len() - suffix;
    let right_tail = right.len() - suffix;
    ops.extend((0..suffix).map(|k| DiffOp::Keep {
        left: left_tail + k,
        right: right_tail + k,
    }));
    ops
}

/// Counts the operations of a script that are not [`DiffOp::Keep`].
pub fn edit_distance(ops: &[DiffOp]) -> usize {
    ops.iter()
        .filter(|op| !matches!(op, DiffOp::Keep { .. }))
        .count()
}
