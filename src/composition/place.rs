use crate::{
    composition::model::Timeline,
    composition::node::{ComponentNode, NodeId, Owner},
    foundation::error::{MontageError, MontageResult},
};

#[derive(Clone, Debug, Default)]
/// Optional placement strategy inputs for [`Timeline::place`].
///
/// At most one strategy fires, in precedence order: explicit `start_frame`,
/// then `align_to` (+ `offset_sec`), then `gap_before_sec`, then the track's
/// sequential default. Seconds-valued fields are converted through the
/// timeline fps with flooring.
pub struct PlaceOpts {
    /// Explicit start frame, used verbatim.
    pub start_frame: Option<u64>,
    /// Align to the most recently appended node on another track.
    pub align_to: Option<String>,
    /// Offset in seconds applied on top of an alignment anchor; may be
    /// negative.
    pub offset_sec: Option<f64>,
    /// Gap in seconds inserted after the track cursor.
    pub gap_before_sec: Option<f64>,
}

impl PlaceOpts {
    /// Empty options: default sequential placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit start frame.
    pub fn start_frame(mut self, frame: u64) -> Self {
        self.start_frame = Some(frame);
        self
    }

    /// Align to the named track's most recent placement.
    pub fn align_to(mut self, track: impl Into<String>) -> Self {
        self.align_to = Some(track.into());
        self
    }

    /// Offset in seconds for alignment.
    pub fn offset_sec(mut self, secs: f64) -> Self {
        self.offset_sec = Some(secs);
        self
    }

    /// Gap in seconds before the node.
    pub fn gap_before_sec(mut self, secs: f64) -> Self {
        self.gap_before_sec = Some(secs);
        self
    }
}

impl Timeline {
    /// Place a node on a track, resolving its absolute timing.
    ///
    /// `duration_sec` is converted to frames by flooring. The placement
    /// strategy comes from `opts` (see [`PlaceOpts`]); with empty options the
    /// node lands at `cursor + default_gap`. All validation happens before
    /// any state change, so a failed call leaves the timeline untouched.
    #[tracing::instrument(skip(self, node, opts), fields(tag = %node.type_tag, track = track_name))]
    pub fn place(
        &mut self,
        node: ComponentNode,
        duration_sec: f64,
        track_name: &str,
        opts: PlaceOpts,
    ) -> MontageResult<NodeId> {
        if !duration_sec.is_finite() || duration_sec < 0.0 {
            return Err(MontageError::placement(format!(
                "invalid timing: duration {duration_sec}s must be finite and >= 0"
            )));
        }
        let track_layer = self
            .track(track_name)
            .ok_or_else(|| MontageError::placement(format!("unknown track '{track_name}'")))?
            .layer;
        let duration_frames = self.fps().secs_to_frames_floor(duration_sec);
        let start_frame = self.resolve_start_frame(track_name, &opts)?;
        let child_ids = self.check_child_props(&node)?;

        let mut node = node;
        node.start_frame = start_frame;
        node.duration_frames = duration_frames;
        if node.layer.is_none() {
            node.layer = Some(track_layer);
        }
        let id = self.arena_mut().push(node);
        for child in child_ids {
            self.arena_mut().claim(child, Owner::Parent(id))?;
        }
        self.arena_mut().claim(id, Owner::Track(track_name.to_string()))?;
        let track = self
            .track_mut(track_name)
            .ok_or_else(|| MontageError::placement(format!("unknown track '{track_name}'")))?;
        track.nodes.push(id);
        track.cursor = start_frame + duration_frames;
        tracing::debug!(start_frame, duration_frames, "placed node");
        Ok(id)
    }

    /// Resolve the start frame for a placement on `track_name`.
    ///
    /// Precedence: explicit frame, alignment (when the target has at least
    /// one placement), gap-before, sequential default. An alignment target
    /// that exists but is empty falls through to the remaining rules.
    fn resolve_start_frame(&self, track_name: &str, opts: &PlaceOpts) -> MontageResult<u64> {
        if let Some(frame) = opts.start_frame {
            return Ok(frame);
        }

        if let Some(target_name) = &opts.align_to {
            let target = self.track(target_name).ok_or_else(|| {
                MontageError::placement(format!(
                    "alignment target track '{target_name}' not found"
                ))
            })?;
            if let Some(anchor_id) = target.last_placed() {
                let anchor = self.node(anchor_id).ok_or_else(|| {
                    MontageError::structural(format!(
                        "track '{target_name}' references unknown node id {}",
                        anchor_id.0
                    ))
                })?;
                let offset = self.checked_frame_delta(opts.offset_sec, "offset")?;
                return checked_start(anchor.start_frame as i64 + offset);
            }
        }

        let track = self
            .track(track_name)
            .ok_or_else(|| MontageError::placement(format!("unknown track '{track_name}'")))?;
        if let Some(gap) = opts.gap_before_sec {
            if !gap.is_finite() {
                return Err(MontageError::placement(format!(
                    "invalid timing: gap_before {gap}s must be finite"
                )));
            }
            let delta = self.fps().secs_to_frame_delta(gap);
            return checked_start(track.cursor as i64 + delta);
        }

        Ok(track.cursor + track.default_gap)
    }

    fn checked_frame_delta(&self, secs: Option<f64>, what: &str) -> MontageResult<i64> {
        match secs {
            None => Ok(0),
            Some(s) if !s.is_finite() => Err(MontageError::placement(format!(
                "invalid timing: {what} {s}s must be finite"
            ))),
            Some(s) => Ok(self.fps().secs_to_frame_delta(s)),
        }
    }
}

fn checked_start(frame: i64) -> MontageResult<u64> {
    if frame < 0 {
        return Err(MontageError::placement(format!(
            "invalid timing: resolved start frame {frame} is negative"
        )));
    }
    Ok(frame as u64)
}

#[cfg(test)]
#[path = "../../tests/unit/composition/place.rs"]
mod tests;
