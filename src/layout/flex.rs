//! # Flex Distribution
//!
//! The arithmetic behind vertical stacking. Fixed children are laid out
//! first and consume height in declaration order; whatever height the
//! parent has left is then shared among the flexible children in
//! proportion to their weights.

/// Height left for flexible children: `max(parent - used, 0)`. A parent
/// without a definite height leaves nothing to share.
pub fn remaining_space(parent_height: Option<f64>, used: f64) -> f64 {
    (parent_height.unwrap_or(0.0) - used).max(0.0)
}

/// Distribute `remaining` among items by weight.
///
/// `items` are `(size, weight)` pairs; each size grows by
/// `weight / total_weight × remaining`. Nothing happens when there is no
/// weight or no space.
pub fn distribute_grow(items: &mut [(f64, f64)], remaining: f64) {
    let total: f64 = items.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || remaining <= 0.0 {
        return;
    }
    for (size, weight) in items.iter_mut() {
        *size += remaining * (*weight / total);
    }
}

/// Heights for flexible children with the given weights, in the same order.
pub fn flex_heights(weights: &[f64], remaining: f64) -> Vec<f64> {
    let mut items: Vec<(f64, f64)> = weights.iter().map(|w| (0.0, *w)).collect();
    distribute_grow(&mut items, remaining);
    items.into_iter().map(|(h, _)| h).collect()
}
