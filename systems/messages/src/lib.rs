#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Transient notification queue for trick titles, star payouts and badges.
//!
//! The queue keeps a newest-first list of message blocks. Rapid repeats of the
//! same title merge into one block, capacity follows a density mode derived
//! from the free vertical space between the HUD (or the combo banner) and the
//! road, and a priority announcement can take over the lane for a while. The
//! queue only tracks state and geometry; drawing is left to the adapter that
//! reads [`MessageQueue::views`].

mod text;

use std::time::Duration;

use celo_riders_core::{BlockId, PowerUpKind, Stars};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Window within which a repeated title merges into the newest block.
pub const MERGE_WINDOW: Duration = Duration::from_millis(500);
/// Time a regular block stays on screen before fading.
pub const BLOCK_LIFETIME: Duration = Duration::from_millis(1500);
/// Time a system badge stays on screen before fading.
pub const SYSTEM_BADGE_LIFETIME: Duration = Duration::from_millis(1200);
/// Duration of the entry animation.
pub const ENTRY_DURATION: Duration = Duration::from_millis(300);
/// Fade applied when a block expires.
pub const EXPIRY_FADE: Duration = Duration::from_millis(500);
/// Fade applied to blocks evicted for capacity or vertical space.
pub const EVICTION_FADE: Duration = Duration::from_millis(100);
/// Fade applied to older blocks pushed out of the newest slot.
pub const LAYOUT_FADE: Duration = Duration::from_millis(150);
/// Age at which info lines begin fading in compact and emergency modes.
pub const INFO_FADE_START: Duration = Duration::from_millis(600);
/// Age at which info lines are fully faded in compact and emergency modes.
pub const INFO_FADE_END: Duration = Duration::from_millis(900);
/// Default hold time of a priority message.
pub const PRIORITY_DURATION: Duration = Duration::from_millis(4000);
/// Intro animation of a priority message.
pub const PRIORITY_INTRO: Duration = Duration::from_millis(300);
/// Fade-out of a priority message.
pub const PRIORITY_FADE: Duration = Duration::from_millis(500);
/// Extra suppression after a priority message's hold time.
pub const PRIORITY_GRACE: Duration = Duration::from_millis(500);
/// Title enqueued when a combo banner closes with a payout.
pub const COMBO_TITLE: &str = "COMBO!";

const ABBREVIATION_WIDTH_FRACTION: f32 = 0.9;

/// Faults inside the queue. They are logged and recovered from, never returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Scheduling a priority message overflowed the scene clock.
    #[error("priority message of {duration:?} overflows the scene clock")]
    ClockOverflow {
        /// Requested hold time.
        duration: Duration,
    },
}

/// Screen geometry the queue lays blocks out in, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLayout {
    /// Logical screen width.
    pub screen_width: f32,
    /// Fraction of the width kept free on either side.
    pub safe_margin_fraction: f32,
    /// Padding between the lane edges and the text.
    pub glyph_pad: f32,
    /// Gap between the lane and the elements bounding it.
    pub lane_gap: f32,
    /// Bottom edge of the HUD.
    pub hud_bottom: f32,
    /// Top edge of the road.
    pub road_y: f32,
    /// Top of the combo banner.
    pub combo_y: f32,
    /// Height reserved for the combo banner.
    pub combo_height: f32,
    /// Y coordinate of the newest block.
    pub base_y: f32,
    /// Blocks that would sit above this line are evicted.
    pub min_y: f32,
    /// Advance width of one title glyph.
    pub glyph_width: f32,
}

impl Default for MessageLayout {
    fn default() -> Self {
        Self {
            screen_width: 640.0,
            safe_margin_fraction: 0.07,
            glyph_pad: 14.0,
            lane_gap: 14.0,
            hud_bottom: 140.0,
            road_y: 550.0,
            combo_y: 250.0,
            combo_height: 60.0,
            base_y: 250.0,
            min_y: 150.0,
            glyph_width: 24.0,
        }
    }
}

impl MessageLayout {
    fn center_x(&self) -> f32 {
        self.screen_width / 2.0
    }

    fn safe_width(&self) -> f32 {
        self.screen_width * (1.0 - 2.0 * self.safe_margin_fraction)
    }

    fn available_height(&self, combo_visible: bool) -> f32 {
        let top = if combo_visible {
            self.combo_y + self.combo_height + self.lane_gap
        } else {
            self.hud_bottom + self.lane_gap
        };
        let bottom = self.road_y - self.lane_gap;
        bottom - top
    }

    fn needs_abbreviation(&self, title: &str) -> bool {
        let width = title.chars().count() as f32 * self.glyph_width;
        width > (self.safe_width() - 2.0 * self.glyph_pad) * ABBREVIATION_WIDTH_FRACTION
    }
}

/// Capacity and spacing regime of the lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityMode {
    /// Two blocks, generous spacing. Only without a combo banner.
    #[default]
    Normal,
    /// Two blocks, tight spacing; only the newest shows its info line.
    Compact,
    /// A single block.
    Emergency,
}

impl DensityMode {
    /// Maximum number of live blocks.
    #[must_use]
    pub const fn max_blocks(self) -> usize {
        match self {
            Self::Normal | Self::Compact => 2,
            Self::Emergency => 1,
        }
    }

    /// Vertical distance between neighbouring blocks.
    #[must_use]
    pub const fn spacing(self) -> f32 {
        match self {
            Self::Normal | Self::Emergency => 60.0,
            Self::Compact => 50.0,
        }
    }

    fn select(layout: &MessageLayout, combo_visible: bool) -> Self {
        let available = layout.available_height(combo_visible);
        if !combo_visible && available >= 2.0 * Self::Normal.spacing() {
            Self::Normal
        } else if available >= 2.0 * Self::Compact.spacing() {
            Self::Compact
        } else {
            Self::Emergency
        }
    }
}

/// Whether a block renders its info line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeHint {
    /// Title and info line.
    #[default]
    Full,
    /// Title only.
    TitleOnly,
}

/// Lifecycle of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Running its entry animation.
    Entering,
    /// Fully shown.
    Visible,
    /// Fading out; removed once the fade ends.
    Exiting,
}

/// Options for [`MessageQueue::add_message`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageFlags {
    /// Short-lived badge that shows its title as the info line.
    pub system_badge: bool,
}

/// One notification in the lane.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageBlock {
    id: BlockId,
    title_base: String,
    repeat_count: u32,
    info: Option<String>,
    system_badge: bool,
    created_at: Duration,
    visible_until: Duration,
    state: BlockState,
    mode_hint: ModeHint,
    anchor: Vec2,
    removal_at: Option<Duration>,
}

impl MessageBlock {
    /// Identifier assigned when the block was created.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Title without the repeat suffix.
    #[must_use]
    pub fn title_base(&self) -> &str {
        &self.title_base
    }

    /// How many times the title has been merged into this block, at least 1.
    #[must_use]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Secondary line such as `+4 STARS`.
    #[must_use]
    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    /// Reports whether the block is a system badge.
    #[must_use]
    pub fn is_system_badge(&self) -> bool {
        self.system_badge
    }

    /// Scene time of creation.
    #[must_use]
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Scene time at which the block starts fading.
    #[must_use]
    pub fn visible_until(&self) -> Duration {
        self.visible_until
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Whether the info line is shown.
    #[must_use]
    pub fn mode_hint(&self) -> ModeHint {
        self.mode_hint
    }

    /// Layout position of the block's baseline centre.
    #[must_use]
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Title as displayed, with the ` +N` suffix for merged repeats.
    #[must_use]
    pub fn display_title(&self) -> String {
        if self.repeat_count > 1 {
            format!("{} +{}", self.title_base, self.repeat_count)
        } else {
            self.title_base.clone()
        }
    }

    fn is_live(&self) -> bool {
        self.state != BlockState::Exiting
    }

    fn begin_exit(&mut self, now: Duration, fade: Duration) {
        if self.state == BlockState::Exiting {
            return;
        }
        self.state = BlockState::Exiting;
        self.removal_at = Some(now.saturating_add(fade));
    }
}

/// Presentation data for one block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockView {
    /// Block the view was built from.
    pub id: BlockId,
    /// Title lines, wrapped and abbreviated for older blocks.
    pub lines: Vec<String>,
    /// Info line, present only when the block shows it.
    pub info: Option<String>,
    /// Opacity of the info line.
    pub info_alpha: f32,
    /// Layout anchor.
    pub anchor: Vec2,
    /// Lifecycle state.
    pub state: BlockState,
}

/// The active combo banner shown above the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboBanner {
    /// Bonus stars of the combo.
    pub multiplier: u32,
    /// Stars paid out if the rider lands now.
    pub stars_to_earn: Stars,
}

impl ComboBanner {
    /// Banner text.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{COMBO_TITLE}\n+{} STARS", self.stars_to_earn.get())
    }
}

/// A centred announcement that takes over the lane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityMessage {
    /// Headline.
    pub title: String,
    /// Second line.
    pub description: String,
    /// Scene time the announcement appeared.
    pub shown_at: Duration,
    /// Scene time the fade-out completes.
    pub hides_at: Duration,
}

/// Newest-first notification queue driven by the scene clock.
#[derive(Clone, Debug, Default)]
pub struct MessageQueue {
    layout: MessageLayout,
    blocks: Vec<MessageBlock>,
    next_id: u64,
    density: DensityMode,
    combo_banner: Option<ComboBanner>,
    priority: Option<PriorityMessage>,
    suppressed_until: Option<Duration>,
    now: Duration,
}

impl MessageQueue {
    /// Creates an empty queue for the given geometry.
    #[must_use]
    pub fn new(layout: MessageLayout) -> Self {
        let mut queue = Self {
            layout,
            ..Self::default()
        };
        queue.update_density();
        queue
    }

    /// Enqueues a notification, merging it into the newest block when the
    /// same title arrives within [`MERGE_WINDOW`]. Ignored while a priority
    /// message suppresses the lane.
    pub fn add_message(&mut self, title: &str, stars: Option<Stars>, flags: MessageFlags) {
        if self.is_suppressed() {
            tracing::debug!(title, "message suppressed by priority announcement");
            return;
        }

        let stars = stars.filter(|stars| !stars.is_zero());
        let now = self.now;
        if let Some(block) = self.blocks.first_mut().filter(|block| {
            block.is_live()
                && block.title_base == title
                && block.system_badge == flags.system_badge
                && now.saturating_sub(block.created_at) <= MERGE_WINDOW
        }) {
            block.repeat_count = block.repeat_count.saturating_add(1);
            if let Some(stars) = stars {
                let total = u64::from(stars.get()) * u64::from(block.repeat_count);
                block.info = Some(format!("+{total} STARS"));
            }
            tracing::debug!(title, repeat = block.repeat_count, "message merged");
            return;
        }

        self.update_density();

        let info = if flags.system_badge {
            Some(title.to_owned())
        } else {
            stars.map(|stars| match stars.get() {
                1 => "+1 STAR".to_owned(),
                count => format!("+{count} STARS"),
            })
        };
        let lifetime = if flags.system_badge {
            SYSTEM_BADGE_LIFETIME
        } else {
            BLOCK_LIFETIME
        };

        let id = BlockId::new(self.next_id);
        self.next_id += 1;
        self.blocks.insert(
            0,
            MessageBlock {
                id,
                title_base: title.to_owned(),
                repeat_count: 1,
                info,
                system_badge: flags.system_badge,
                created_at: now,
                visible_until: now.saturating_add(lifetime),
                state: BlockState::Entering,
                mode_hint: ModeHint::Full,
                anchor: Vec2::new(self.layout.center_x(), self.layout.base_y),
                removal_at: None,
            },
        );
        tracing::debug!(title, id = id.get(), density = ?self.density, "message added");

        self.layout_blocks();
    }

    /// Enqueues the badge for a collected power-up.
    pub fn add_power_up_message(&mut self, kind: PowerUpKind) {
        self.add_message(
            kind.badge_title(),
            None,
            MessageFlags { system_badge: true },
        );
    }

    /// Clears the lane and shows a centred announcement for `duration`.
    ///
    /// Regular messages are suppressed until `duration` plus a short grace
    /// period has passed. A scheduling fault clears the lane and lifts the
    /// suppression instead of leaving it stuck.
    pub fn add_priority_message(&mut self, title: &str, description: &str, duration: Duration) {
        match self.schedule_priority(title, description, duration) {
            Ok(()) => {
                tracing::info!(title, ?duration, "priority message shown");
            }
            Err(error) => {
                tracing::warn!(%error, "priority message dropped");
                self.priority = None;
                self.suppressed_until = None;
                self.blocks.clear();
            }
        }
    }

    fn schedule_priority(
        &mut self,
        title: &str,
        description: &str,
        duration: Duration,
    ) -> Result<(), MessageError> {
        let overflow = MessageError::ClockOverflow { duration };
        let hides_at = self
            .now
            .checked_add(PRIORITY_INTRO)
            .and_then(|at| at.checked_add(duration))
            .and_then(|at| at.checked_add(PRIORITY_FADE))
            .ok_or(overflow)?;
        let suppressed_until = self
            .now
            .checked_add(duration)
            .and_then(|at| at.checked_add(PRIORITY_GRACE))
            .ok_or(overflow)?;

        self.blocks.clear();
        self.priority = Some(PriorityMessage {
            title: title.to_owned(),
            description: description.to_owned(),
            shown_at: self.now,
            hides_at,
        });
        self.suppressed_until = Some(suppressed_until);
        Ok(())
    }

    /// Shows the combo banner, shrinking the lane.
    pub fn show_active_combo(&mut self, multiplier: u32, stars_to_earn: Stars) {
        self.combo_banner = Some(ComboBanner {
            multiplier,
            stars_to_earn,
        });
        self.update_density();
        self.layout_blocks();
    }

    /// Refreshes the combo banner if it is shown.
    pub fn update_active_combo(&mut self, multiplier: u32, stars_to_earn: Stars) {
        if let Some(banner) = self.combo_banner.as_mut() {
            banner.multiplier = multiplier;
            banner.stars_to_earn = stars_to_earn;
        }
    }

    /// Hides the combo banner and announces the payout, if any.
    pub fn hide_active_combo(&mut self, final_stars: Stars) {
        self.combo_banner = None;
        if !final_stars.is_zero() {
            self.add_message(COMBO_TITLE, Some(final_stars), MessageFlags::default());
        }
        self.update_density();
        self.layout_blocks();
    }

    /// Advances the queue to scene time `now`.
    pub fn update(&mut self, now: Duration) {
        self.now = self.now.max(now);
        let now = self.now;

        if self.suppressed_until.is_some_and(|until| now >= until) {
            self.suppressed_until = None;
            tracing::debug!("message suppression lifted");
        }
        if self.priority.as_ref().is_some_and(|message| now >= message.hides_at) {
            self.priority = None;
        }

        for block in &mut self.blocks {
            if block.state == BlockState::Entering
                && now >= block.created_at.saturating_add(ENTRY_DURATION)
            {
                block.state = BlockState::Visible;
            }
            if block.is_live() && now >= block.visible_until {
                block.begin_exit(now, EXPIRY_FADE);
            }
        }

        let before = self.blocks.len();
        self.blocks
            .retain(|block| block.removal_at.map_or(true, |at| now < at));
        if self.blocks.len() != before {
            self.update_density();
            self.layout_blocks();
        }
    }

    /// Removes every block and the combo banner.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.combo_banner = None;
        self.update_density();
    }

    /// Blocks, newest first, including those fading out.
    #[must_use]
    pub fn blocks(&self) -> &[MessageBlock] {
        &self.blocks
    }

    /// Number of blocks not yet fading out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_live()).count()
    }

    /// Current density mode.
    #[must_use]
    pub fn density_mode(&self) -> DensityMode {
        self.density
    }

    /// Reports whether regular messages are currently suppressed.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed_until.is_some_and(|until| self.now < until)
    }

    /// The priority announcement on screen, if any.
    #[must_use]
    pub fn priority_message(&self) -> Option<&PriorityMessage> {
        self.priority.as_ref()
    }

    /// The combo banner, if shown.
    #[must_use]
    pub fn combo_banner(&self) -> Option<&ComboBanner> {
        self.combo_banner.as_ref()
    }

    /// Geometry in use.
    #[must_use]
    pub fn layout(&self) -> &MessageLayout {
        &self.layout
    }

    /// Builds presentation data for every block, newest first.
    #[must_use]
    pub fn views(&self) -> Vec<BlockView> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| self.view(index, block))
            .collect()
    }

    fn view(&self, index: usize, block: &MessageBlock) -> BlockView {
        let title = block.display_title();
        let mut lines = text::wrap_title(&title);
        if index > 0 && (lines.len() > 1 || self.layout.needs_abbreviation(&title)) {
            lines = text::wrap_title(&text::abbreviate(&title));
        }

        let info = match block.mode_hint {
            ModeHint::Full => block.info.clone(),
            ModeHint::TitleOnly => None,
        };

        BlockView {
            id: block.id,
            lines,
            info,
            info_alpha: self.info_alpha(block),
            anchor: block.anchor,
            state: block.state,
        }
    }

    fn info_alpha(&self, block: &MessageBlock) -> f32 {
        if self.density == DensityMode::Normal || block.state != BlockState::Visible {
            return 1.0;
        }
        let age = self.now.saturating_sub(block.created_at);
        if age < INFO_FADE_START {
            1.0
        } else if age <= INFO_FADE_END {
            let progress = (age - INFO_FADE_START).as_secs_f32()
                / (INFO_FADE_END - INFO_FADE_START).as_secs_f32();
            1.0 - progress
        } else {
            0.0
        }
    }

    fn update_density(&mut self) {
        let density = DensityMode::select(&self.layout, self.combo_banner.is_some());
        if density != self.density {
            tracing::debug!(from = ?self.density, to = ?density, "message density changed");
            self.density = density;
        }
    }

    fn layout_blocks(&mut self) {
        let now = self.now;
        let max_blocks = self.density.max_blocks();

        let mut live = self.live_count();
        for block in self.blocks.iter_mut().rev() {
            if live <= max_blocks {
                break;
            }
            if block.is_live() {
                block.begin_exit(now, EVICTION_FADE);
                live -= 1;
            }
        }

        let spacing = self.density.spacing();
        let center_x = self.layout.center_x();
        let mut index = 0usize;
        for block in self.blocks.iter_mut().filter(|block| block.is_live()) {
            let y = self.layout.base_y - index as f32 * spacing;
            if y < self.layout.min_y {
                block.begin_exit(now, EVICTION_FADE);
                index += 1;
                continue;
            }

            block.anchor = Vec2::new(center_x, y);
            block.mode_hint = match (self.density, index) {
                (DensityMode::Normal, _) | (_, 0) => ModeHint::Full,
                _ => ModeHint::TitleOnly,
            };
            if index > 0 {
                block.begin_exit(now, LAYOUT_FADE);
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_selects_normal_then_compact_with_banner() {
        let layout = MessageLayout::default();
        assert_eq!(DensityMode::select(&layout, false), DensityMode::Normal);
        assert_eq!(DensityMode::select(&layout, true), DensityMode::Compact);
    }

    #[test]
    fn long_titles_need_abbreviation() {
        let layout = MessageLayout::default();
        assert!(!layout.needs_abbreviation("Trash Nose Grab"));
        assert!(layout.needs_abbreviation("Trash Nose Grab x Cone Nose Grab"));
    }

    #[test]
    fn priority_overflow_clears_the_lane() {
        let mut queue = MessageQueue::default();
        queue.add_message("Kickflip", None, MessageFlags::default());

        queue.add_priority_message("WAVE 2", "GET READY", Duration::MAX);

        assert!(queue.blocks().is_empty());
        assert!(!queue.is_suppressed());
        assert!(queue.priority_message().is_none());
    }
}
