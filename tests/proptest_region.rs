use proptest::prelude::*;
use taglift::region::{validate_region, RawRegion, RejectReason, TagId, TagRegistry};

fn registry() -> TagRegistry {
    TagRegistry::from_pairs([("obj".to_string(), TagId::new("t-obj"))])
}

fn raw(left: f64, top: f64, width: f64, height: f64) -> RawRegion {
    RawRegion {
        tag: "obj".to_string(),
        left,
        top,
        width,
        height,
    }
}

proptest! {
    #[test]
    fn accepted_regions_stay_inside_the_unit_square(
        left in 0.0f64..=1.0,
        top in 0.0f64..=1.0,
        width in 0.0f64..=1.0,
        height in 0.0f64..=1.0,
    ) {
        if let Ok(region) = validate_region(&raw(left, top, width, height), &registry()) {
            prop_assert!(region.left + region.width <= 1.0 + 1e-12);
            prop_assert!(region.top + region.height <= 1.0 + 1e-12);
            prop_assert!(region.width > 0.0);
            prop_assert!(region.height > 0.0);
            prop_assert!((0.0..=1.0).contains(&region.left));
            prop_assert!((0.0..=1.0).contains(&region.top));
            // The origin is never shifted by the width/height cap.
            prop_assert_eq!(region.left, left.clamp(0.0, 1.0));
            prop_assert_eq!(region.top, top.clamp(0.0, 1.0));
        }
    }

    #[test]
    fn in_range_regions_are_never_rejected_as_out_of_range(
        left in 0.0f64..=1.0,
        top in 0.0f64..=1.0,
        width in 0.0f64..=1.0,
        height in 0.0f64..=1.0,
    ) {
        let result = validate_region(&raw(left, top, width, height), &registry());
        prop_assert!(result != Err(RejectReason::OutOfRange));
    }

    #[test]
    fn values_outside_tolerance_are_rejected_not_clamped(
        excess in 0.001f64..=100.0,
        top in 0.0f64..=0.5,
    ) {
        let negative_width = validate_region(&raw(0.1, top, -excess, 0.2), &registry());
        prop_assert_eq!(negative_width, Err(RejectReason::OutOfRange));

        let oversized_left = validate_region(&raw(1.0 + excess, top, 0.2, 0.2), &registry());
        prop_assert_eq!(oversized_left, Err(RejectReason::OutOfRange));
    }

    #[test]
    fn validation_is_deterministic(
        left in -0.5f64..=1.5,
        top in -0.5f64..=1.5,
        width in -0.5f64..=1.5,
        height in -0.5f64..=1.5,
    ) {
        let region = raw(left, top, width, height);
        let first = validate_region(&region, &registry());
        let second = validate_region(&region, &registry());
        prop_assert_eq!(first, second);
    }
}
