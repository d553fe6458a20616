//! Value normalization shared by cameras and stations
//!
//! Both ends must derive the same frame rate bounds and watchdog timeout, or
//! liveness detection diverges.

use super::ResolutionTier;

/// Lowest frame rate a camera will stream at
pub const MIN_FPS: i32 = 1;

/// Highest frame rate a camera will stream at
pub const MAX_FPS: i32 = 30;

/// Frame rate of a freshly initialized stream
pub const DEFAULT_FPS: i32 = 18;

/// Lower bound of the watchdog timeout (ms)
pub const MIN_WATCHDOG_MS: u32 = 500;

/// Upper bound of the watchdog timeout (ms)
pub const MAX_WATCHDOG_MS: u32 = 2000;

/// Clamp a frame rate into `[MIN_FPS, MAX_FPS]`
pub fn clamp_fps(fps: i32) -> i32 {
    fps.clamp(MIN_FPS, MAX_FPS)
}

/// Milliseconds without a packet after which a camera is considered gone
pub fn watchdog_timeout(fps: i32) -> u32 {
    let ms = fps.saturating_mul(50);
    ms.clamp(MIN_WATCHDOG_MS as i32, MAX_WATCHDOG_MS as i32) as u32
}

/// Fixed frame size of a resolution tier, `None` for [`ResolutionTier::Original`]
pub fn dimensions_for(tier: ResolutionTier) -> Option<(u32, u32)> {
    match tier {
        ResolutionTier::Qcif => Some((176, 144)),
        ResolutionTier::Cif => Some((352, 240)),
        ResolutionTier::TwoCif => Some((704, 240)),
        ResolutionTier::FourCif => Some((704, 480)),
        ResolutionTier::D1 => Some((720, 480)),
        ResolutionTier::Hd720 => Some((1280, 720)),
        ResolutionTier::Hd960 => Some((1280, 960)),
        ResolutionTier::Original => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_fps_bounds() {
        assert_eq!(clamp_fps(0), MIN_FPS);
        assert_eq!(clamp_fps(-40), MIN_FPS);
        assert_eq!(clamp_fps(DEFAULT_FPS), DEFAULT_FPS);
        assert_eq!(clamp_fps(120), MAX_FPS);
    }

    #[test]
    fn test_watchdog_timeout() {
        assert_eq!(watchdog_timeout(1), MIN_WATCHDOG_MS);
        assert_eq!(watchdog_timeout(DEFAULT_FPS), 900);
        assert_eq!(watchdog_timeout(30), 1500);
        assert_eq!(watchdog_timeout(100), MAX_WATCHDOG_MS);
        assert_eq!(watchdog_timeout(-5), MIN_WATCHDOG_MS);
        assert_eq!(watchdog_timeout(i32::MAX), MAX_WATCHDOG_MS);
    }

    #[test]
    fn test_every_fixed_tier_has_dimensions() {
        for tier in ResolutionTier::ALL {
            match dimensions_for(tier) {
                Some((w, h)) => {
                    assert_ne!(tier, ResolutionTier::Original);
                    assert!(w > 0 && h > 0);
                }
                None => assert_eq!(tier, ResolutionTier::Original),
            }
        }
    }

    #[test]
    fn test_dimension_table() {
        assert_eq!(dimensions_for(ResolutionTier::Qcif), Some((176, 144)));
        assert_eq!(dimensions_for(ResolutionTier::TwoCif), Some((704, 240)));
        assert_eq!(dimensions_for(ResolutionTier::Hd960), Some((1280, 960)));
    }

    proptest! {
        #[test]
        fn clamp_fps_is_idempotent(fps in any::<i32>()) {
            let once = clamp_fps(fps);
            prop_assert_eq!(clamp_fps(once), once);
            prop_assert!((MIN_FPS..=MAX_FPS).contains(&once));
        }

        #[test]
        fn watchdog_stays_in_range(fps in any::<i32>()) {
            let ms = watchdog_timeout(fps);
            prop_assert!((MIN_WATCHDOG_MS..=MAX_WATCHDOG_MS).contains(&ms));
        }
    }
}
