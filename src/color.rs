use crate::{
    core::Rgba8,
    error::{DialError, DialResult},
};

/// Piecewise-linear gradient over tick index space.
///
/// The inclusive index domain `[0, tick_count]` is partitioned into
/// `anchors.len() - 1` contiguous segments of equal width, the last segment
/// absorbing the rounding remainder. `color_at` is pure and
/// index-addressable, so results never depend on call order.
#[derive(Clone, Debug)]
pub struct ColorRamp {
    anchors: Vec<Rgba8>,
    tick_count: u32,
}

impl ColorRamp {
    pub fn new(anchors: Vec<Rgba8>, tick_count: u32) -> DialResult<Self> {
        if anchors.len() < 2 {
            return Err(DialError::TooFewAnchors(anchors.len()));
        }
        if tick_count < 1 {
            return Err(DialError::InvalidOption {
                field: "tick_count",
                reason: "must be > 0",
            });
        }
        Ok(Self {
            anchors,
            tick_count,
        })
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    /// Fill color for tick `index` in `[0, tick_count]`.
    pub fn color_at(&self, index: u32) -> DialResult<Rgba8> {
        if index > self.tick_count {
            return Err(DialError::TickIndex {
                index,
                max: self.tick_count,
            });
        }

        let segments = (self.anchors.len() - 1) as u32;
        let base_len = self.tick_count / segments;
        let remainder = self.tick_count % segments;

        let mut start = 0u32;
        for k in 0..segments {
            let len = if k == segments - 1 {
                base_len + remainder
            } else {
                base_len
            };
            let end = start + len;
            // Shared boundaries resolve to the earlier segment's t = 1, which
            // equals the later segment's t = 0.
            if index <= end || k == segments - 1 {
                let a = self.anchors[k as usize];
                let b = self.anchors[k as usize + 1];
                if len == 0 {
                    return Ok(a);
                }
                let t = f64::from(index - start) / f64::from(len);
                return Ok(Rgba8::lerp(a, b, t));
            }
            start = end;
        }

        unreachable!("segment search covers the full index domain");
    }
}
