use core::cmp::Ordering;

use compact_str::CompactString;
use smallvec::SmallVec;

use super::settings::{CaseOrder, DataType, ResolvedLevel, SortOrder, SortSpec};
use crate::handle::NodeHandle;
use crate::iter::{ArrayIterator, AxisIterator};
use crate::router::DocumentRouter;

// ranges at or below this length are insertion sorted
const SMALL_RANGE: usize = 8;

#[derive(Debug, Clone)]
enum SortKey {
    // `folded` is the collation key of the lowercased text, present when the
    // level has a case order: case variants compare equal there first
    Text { folded: Option<CompactString>, key: CompactString, raw: CompactString },
    Number(f64),
}

/// A candidate node with its per-level keys, extracted on first use.
#[derive(Debug)]
struct SortRecord {
    node: NodeHandle,
    input: usize,
    keys: SmallVec<[Option<SortKey>; 4]>,
}

/// XPath `number()` over trimmed text; anything else sorts as `-Infinity`.
pub(crate) fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NEG_INFINITY,
        }
    }
    if !seen_digit {
        return f64::NEG_INFINITY;
    }
    t.parse::<f64>().unwrap_or(f64::NEG_INFINITY)
}

fn case_rank(c: char, order: CaseOrder) -> u8 {
    match (c.is_uppercase(), order) {
        (true, CaseOrder::UpperFirst) | (false, CaseOrder::LowerFirst) => 0,
        _ => 1,
    }
}

/// Orders strings that differ only in case at their first differing character.
fn compare_case(a: &str, b: &str, order: CaseOrder) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            let folded = x.to_lowercase().eq(y.to_lowercase());
            return if folded { case_rank(x, order).cmp(&case_rank(y, order)) } else { Ordering::Equal };
        }
    }
    Ordering::Equal
}

struct Sorter<'a> {
    router: &'a DocumentRouter,
    levels: &'a [ResolvedLevel],
}

impl Sorter<'_> {
    fn ensure_key(&self, rec: &mut SortRecord, level: usize) {
        if rec.keys[level].is_some() {
            return;
        }
        let spec = &self.levels[level];
        let text = spec.key_text(self.router, rec.node);
        let key = match spec.level.data_type {
            DataType::Number => SortKey::Number(parse_number(&text)),
            DataType::Text => SortKey::Text {
                folded: spec.level.case_order.map(|_| CompactString::from(spec.collation.key(&text.to_lowercase()))),
                key: CompactString::from(spec.collation.key(&text)),
                raw: CompactString::from(text),
            },
        };
        rec.keys[level] = Some(key);
    }

    fn compare_level(&self, level: usize, a: &SortKey, b: &SortKey) -> Ordering {
        let spec = &self.levels[level].level;
        let ord = match (a, b) {
            (SortKey::Number(x), SortKey::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (SortKey::Text { folded: fa, key: ka, raw: ra }, SortKey::Text { folded: fb, key: kb, raw: rb }) => fa
                .cmp(fb)
                .then_with(|| spec.case_order.map_or(Ordering::Equal, |co| compare_case(ra, rb, co)))
                .then_with(|| ka.cmp(kb)),
            _ => Ordering::Equal,
        };
        match spec.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }

    fn compare(&self, recs: &mut [SortRecord], i: usize, j: usize) -> Ordering {
        for level in 0..self.levels.len() {
            self.ensure_key(&mut recs[i], level);
            self.ensure_key(&mut recs[j], level);
            let (Some(a), Some(b)) = (&recs[i].keys[level], &recs[j].keys[level]) else { continue };
            let ord = self.compare_level(level, a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.router.compare(recs[i].node, recs[j].node).then(recs[i].input.cmp(&recs[j].input))
    }

    fn insertion_sort(&self, recs: &mut [SortRecord], lo: usize, hi: usize) {
        for i in lo + 1..hi {
            let mut j = i;
            while j > lo && self.compare(recs, j, j - 1) == Ordering::Less {
                recs.swap(j, j - 1);
                j -= 1;
            }
        }
    }

    /// Sorts `recs[lo..hi]`.
    fn quicksort(&self, recs: &mut [SortRecord], mut lo: usize, mut hi: usize) {
        while hi - lo > SMALL_RANGE {
            let mid = lo + (hi - lo) / 2;
            let p = hi - 1;
            // median of lo, mid, p ends up at p
            if self.compare(recs, mid, lo) == Ordering::Less {
                recs.swap(mid, lo);
            }
            if self.compare(recs, p, lo) == Ordering::Less {
                recs.swap(p, lo);
            }
            if self.compare(recs, mid, p) == Ordering::Less {
                recs.swap(mid, p);
            }
            let mut store = lo;
            for j in lo..p {
                if self.compare(recs, j, p) == Ordering::Less {
                    recs.swap(store, j);
                    store += 1;
                }
            }
            recs.swap(store, p);
            if store - lo < hi - store {
                self.quicksort(recs, lo, store);
                lo = store + 1;
            } else {
                self.quicksort(recs, store + 1, hi);
                hi = store;
            }
        }
        self.insertion_sort(recs, lo, hi);
    }
}

/// Drains `source` and returns its nodes ordered by `spec`. Nodes whose keys
/// tie on every level keep document order.
pub fn sort_nodes(router: &DocumentRouter, source: &mut dyn AxisIterator, spec: &SortSpec) -> ArrayIterator {
    let levels = spec.levels.len();
    let mut recs: Vec<SortRecord> = source
        .drain_nodes()
        .into_iter()
        .enumerate()
        .map(|(input, node)| SortRecord { node, input, keys: SmallVec::from_elem(None, levels) })
        .collect();
    let sorter = Sorter { router, levels: &spec.levels };
    let len = recs.len();
    sorter.quicksort(&mut recs, 0, len);
    tracing::trace!(nodes = len, levels, "sorted node set");
    ArrayIterator::new(recs.into_iter().map(|r| r.node).collect::<Vec<_>>())
}
