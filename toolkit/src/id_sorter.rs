use std::cmp::Ordering;

/// A pair of an id and its score, ordered by descending score.
/// Equal scores are ordered by descending id.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IdSorter {
    pub id: usize,
    pub value: f64,
}

impl IdSorter {
    pub fn new(id: usize, value: f64) -> Self {
        Self { id, value }
    }
}

impl Eq for IdSorter {}

impl PartialOrd for IdSorter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdSorter {
    fn cmp(&self, other: &Self) -> Ordering {
        other.value.total_cmp(&self.value).then_with(|| other.id.cmp(&self.id))
    }
}

/// Sorts the `values` by descending value, ties are broken by the higher id.
/// The id of a value is its position in the input.
pub fn sort_ids_by_value<I>(values: I) -> Vec<IdSorter>
where
    I: IntoIterator<Item = f64>
{
    let mut sorted: Vec<IdSorter> = values
        .into_iter()
        .enumerate()
        .map(|(id, value)| IdSorter::new(id, value))
        .collect();
    sorted.sort();
    sorted
}

/// Returns the position of the first maximal element, `None` for an empty input.
pub fn first_max_position<I>(values: I) -> Option<usize>
where
    I: IntoIterator,
    I::Item: PartialOrd
{
    let mut best: Option<(usize, I::Item)> = None;
    for (pos, value) in values.into_iter().enumerate() {
        let is_better = match &best {
            Some((_, current)) => value > *current,
            None => true,
        };
        if is_better {
            best = Some((pos, value));
        }
    }
    best.map(|(pos, _)| pos)
}
