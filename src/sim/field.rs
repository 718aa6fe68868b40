use log::debug;
use rand::Rng;

use super::bubble::{Bubble, Motion, Sprite};

/// Fixed set of bubble slots, recycled in place.
///
/// The slot count only changes through [`BubbleField::ensure_size`], which
/// rebuilds the whole arena. Everything else reuses the existing slots and
/// the sprite buffer, so a steady-state tick does not allocate.
#[derive(Debug, Default)]
pub struct BubbleField {
    bubbles: Vec<Bubble>,
    sprites: Vec<Sprite>,
    rebuilds: usize,
    recycled: usize,
}

impl BubbleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the field had to be rebuilt.
    pub fn ensure_size<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        width: u32,
        height: u32,
        max_size_bound: u32,
        rng: &mut R,
    ) -> bool {
        if self.bubbles.len() == count {
            return false;
        }

        debug!(
            "Rebuilding bubble field (#{}): {} -> {} bubbles on {}x{}.",
            self.rebuilds + 1,
            self.bubbles.len(),
            count,
            width,
            height
        );

        self.bubbles = (0..count)
            .map(|_| Bubble::new(width, height, max_size_bound, rng))
            .collect();
        self.sprites = Vec::with_capacity(count);
        self.rebuilds += 1;

        true
    }

    /// Moves every bubble and recycles the ones that left the canvas.
    ///
    /// While `held`, nothing is recycled but everything keeps moving.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        motion: &Motion,
        width: u32,
        height: u32,
        max_size_bound: u32,
        held: bool,
        rng: &mut R,
    ) -> &[Sprite] {
        self.sprites.clear();
        self.recycled = 0;

        for bubble in self.bubbles.iter_mut() {
            bubble.update(motion, rng);

            if !held && bubble.is_offscreen(width, height) {
                bubble.pop();
                bubble.recycle(false, width, height, max_size_bound, rng);
                self.recycled += 1;
            }

            self.sprites.push(bubble.sprite());
        }

        &self.sprites
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    #[cfg(test)]
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// How many bubbles the last [`BubbleField::tick`] sent back to the bottom.
    pub fn recycled_last_tick(&self) -> usize {
        self.recycled
    }

    /// How many times the arena was reallocated.
    #[cfg(test)]
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    #[cfg(test)]
    pub(crate) fn bubbles_mut(&mut self) -> &mut [Bubble] {
        &mut self.bubbles
    }
}
