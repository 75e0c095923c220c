//! Shared mutable access to the particle array during a parallel phase

use std::marker::PhantomData;

use particle_physics::Particle;

/// Pointer wrapper letting pooled tasks mutate disjoint particles
///
/// # Safety
///
/// Every parallel phase partitions the particles so that no two concurrently
/// running tasks touch the same particle: integration and boundary handling by
/// contiguous id range, collision resolution by non-adjacent column stripes of
/// the grid (each particle lives in exactly one cell). Callers of the unsafe
/// accessors uphold that partition.
#[derive(Clone, Copy)]
pub(crate) struct ParticleSlots<'a> {
    ptr: *mut Particle,
    len: usize,
    _marker: PhantomData<&'a mut [Particle]>,
}

unsafe impl Send for ParticleSlots<'_> {}
unsafe impl Sync for ParticleSlots<'_> {}

impl<'a> ParticleSlots<'a> {
    pub(crate) fn new(particles: &'a mut [Particle]) -> Self {
        Self {
            ptr: particles.as_mut_ptr(),
            len: particles.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// No other live reference to particle `id` may exist.
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub(crate) unsafe fn get_mut(&self, id: usize) -> &mut Particle {
        assert!(id < self.len, "particle id {id} out of range");
        &mut *self.ptr.add(id)
    }

    /// # Safety
    ///
    /// No other live reference into `start..end` may exist.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn range_mut(&self, start: usize, end: usize) -> &mut [Particle] {
        assert!(start <= end && end <= self.len, "range {start}..{end} out of bounds");
        std::slice::from_raw_parts_mut(self.ptr.add(start), end - start)
    }
}
