//! Smooth fade-in of newly grown layers.
//!
//! When a network grows to a new resolution, the previous ("old") path and
//! the freshly added ("new") path run side by side through a [`ConcatTable`],
//! and a [`FadeIn`] blends their outputs while the training loop ramps
//! `alpha` from 0 to 1.

use crate::layers::Transform;
use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};
use std::marker::PhantomData;

/// Runs two branches on the same input and returns both outputs unmerged.
///
/// Both branches are submodules, so their parameters are visited by
/// optimizers, records and `num_params` like any other field.
#[derive(Module, Debug)]
pub struct ConcatTable<B: Backend, Old, New> {
    old: Old,
    new: New,
    _backend: PhantomData<B>,
}

impl<B: Backend, Old, New> ConcatTable<B, Old, New> {
    /// Pairs the stable branch with the one being grown.
    pub fn new(old: Old, new: New) -> Self {
        Self {
            old,
            new,
            _backend: PhantomData,
        }
    }

    /// Returns `(old(input), new(input))`.
    pub fn forward<I: Clone>(&self, input: I) -> (Old::Output, New::Output)
    where
        Old: Transform<I>,
        New: Transform<I>,
    {
        (self.old.forward(input.clone()), self.new.forward(input))
    }

    /// The stable branch.
    pub fn old(&self) -> &Old {
        &self.old
    }

    /// The branch being faded in.
    pub fn new_branch(&self) -> &New {
        &self.new
    }

    /// Splits the table back into `(old, new)`, e.g. to keep only the new
    /// branch once fading is complete.
    pub fn into_parts(self) -> (Old, New) {
        (self.old, self.new)
    }
}

impl<B, I, Old, New> Transform<I> for ConcatTable<B, Old, New>
where
    B: Backend,
    I: Clone,
    Old: Transform<I>,
    New: Transform<I>,
{
    type Output = (Old::Output, New::Output);

    fn forward(&self, input: I) -> Self::Output {
        ConcatTable::forward(self, input)
    }
}

/// Linear blend between an old and a new branch output.
///
/// It performs: output = old * (1 - alpha) + new * alpha
///
/// `alpha` always stays within `[0, 1]`.
#[derive(Module, Clone, Debug, Default)]
pub struct FadeIn {
    alpha: f64,
}

impl FadeIn {
    /// Creates a blender starting at `alpha`, clamped into `[0, 1]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Adds `delta` to alpha and clamps the result into `[0, 1]`.
    pub fn update_alpha(&mut self, delta: f64) {
        let next = self.alpha + delta;
        self.alpha = next.clamp(0.0, 1.0);
        if next != self.alpha {
            log::trace!("fade-in alpha saturated at {} (requested {})", self.alpha, next);
        }
    }

    /// Returns the current blend factor, always within `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// True once the new branch has fully replaced the old one.
    pub fn is_complete(&self) -> bool {
        self.alpha >= 1.0
    }

    /// Blends `(old, new)` branch outputs of broadcast-compatible shapes.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        branches: (Tensor<B, D>, Tensor<B, D>),
    ) -> Tensor<B, D> {
        let (old, new) = branches;
        if self.alpha <= 0.0 {
            return old;
        }
        if self.alpha >= 1.0 {
            return new;
        }
        old.mul_scalar(1.0 - self.alpha) + new.mul_scalar(self.alpha)
    }
}

impl<B: Backend, const D: usize> Transform<(Tensor<B, D>, Tensor<B, D>)> for FadeIn {
    type Output = Tensor<B, D>;

    fn forward(&self, branches: (Tensor<B, D>, Tensor<B, D>)) -> Tensor<B, D> {
        FadeIn::forward(self, branches)
    }
}
