use std::cmp::Ordering;

use crate::tally::FrequencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    pub number: u32,
    pub count: u64,
}

/// Most drawn first; among equal counts the smaller number wins.
pub fn rank_order(a: &Ranked, b: &Ranked) -> Ordering {
    b.count.cmp(&a.count).then(a.number.cmp(&b.number))
}

/// Every slot of the table, best first.
pub fn ranking(table: &FrequencyTable) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = table
        .counts()
        .iter()
        .enumerate()
        .map(|(number, &count)| Ranked {
            number: number as u32,
            count,
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

/// The `n` most frequent numbers, ascending.
///
/// Asking for more than `max + 1` numbers returns every slot, 0 included.
pub fn top_n(table: &FrequencyTable, n: usize) -> Vec<u32> {
    let mut picked: Vec<u32> = ranking(table)
        .into_iter()
        .take(n)
        .map(|r| r.number)
        .collect();
    picked.sort_unstable();
    picked
}
