#[cfg(test)]
mod tests {
    use glam::{DQuat, DVec3};

    use crate::commands::AbilityCommand;
    use crate::components::Vitals;
    use crate::config::Loadout;
    use crate::descriptor::{AbilityDescriptor, AbilityKind, PhaseSegment};
    use crate::enums::*;
    use crate::error::ConfigError;
    use crate::types::{AgentParams, EntityId, LayerMask, ParamValue, Transform};
    use crate::world::Damageable;

    // ---- Loadouts ----

    #[test]
    fn test_all_presets_validate() {
        for id in LoadoutId::ALL {
            let loadout = Loadout::preset(id);
            assert!(
                loadout.validate().is_ok(),
                "Preset {} should validate",
                id.name()
            );
            assert_eq!(loadout.slots.len(), 2);
        }
    }

    #[test]
    fn test_loadout_name_lookup() {
        for id in LoadoutId::ALL {
            assert_eq!(LoadoutId::from_name(id.name()), Some(id));
        }
        assert_eq!(LoadoutId::from_name("nope"), None);
    }

    #[test]
    fn test_loadout_json_fills_defaults() {
        let json = r#"{
            "slots": [
                { "name": "Hop", "duration_secs": 0.0, "kind": { "type": "Blink", "distance": 4.0 } },
                { "name": "Back", "duration_secs": 2.0, "kind": { "type": "Rewind" } }
            ]
        }"#;
        let loadout = Loadout::from_json_str(json).unwrap();
        let hop = loadout.slots[0].as_ref().unwrap();
        match &hop.kind {
            AbilityKind::Blink(t) => {
                assert_eq!(t.distance, 4.0);
                assert_eq!(t.standoff, crate::constants::BLINK_STANDOFF);
                assert_eq!(t.obstacle_mask, LayerMask::SOLID);
            }
            other => panic!("Expected blink, got {other:?}"),
        }
        assert_eq!(hop.reentry(), ReentryPolicy::Reject);
        assert!(matches!(
            loadout.slots[1].as_ref().unwrap().kind,
            AbilityKind::Rewind
        ));
    }

    #[test]
    fn test_loadout_rejects_too_many_slots() {
        let loadout = Loadout {
            slots: vec![
                Some(AbilityDescriptor::blink()),
                Some(AbilityDescriptor::dash()),
                Some(AbilityDescriptor::rewind()),
            ],
        };
        assert!(matches!(loadout.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_loadout_rejects_descending_segments() {
        let mut deadeye = AbilityDescriptor::deadeye();
        if let AbilityKind::Deadeye(t) = &mut deadeye.kind {
            t.segments = vec![
                PhaseSegment::bounded(3.0, 100.0),
                PhaseSegment::bounded(1.0, 200.0),
            ];
        }
        let loadout = Loadout {
            slots: vec![Some(deadeye)],
        };
        let err = loadout.validate().unwrap_err();
        assert!(
            err.to_string().contains("not ascending"),
            "Unexpected error: {err}"
        );
    }

    #[test]
    fn test_loadout_rejects_open_segment_before_last() {
        let mut deadeye = AbilityDescriptor::deadeye();
        if let AbilityKind::Deadeye(t) = &mut deadeye.kind {
            t.segments = vec![PhaseSegment::open(100.0), PhaseSegment::bounded(1.0, 200.0)];
        }
        let loadout = Loadout {
            slots: vec![Some(deadeye)],
        };
        assert!(loadout.validate().is_err());
    }

    #[test]
    fn test_loadout_rejects_bad_slow_factor() {
        let mut drone = AbilityDescriptor::snow_drone();
        if let AbilityKind::Drone(t) = &mut drone.kind {
            t.slow_factor = 1.5;
        }
        let loadout = Loadout {
            slots: vec![Some(drone)],
        };
        assert!(matches!(loadout.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_frostbite_preset() {
        let loadout = Loadout::preset(LoadoutId::Frostbite);
        let kinds: Vec<&str> = loadout
            .slots
            .iter()
            .flatten()
            .map(|d| d.kind.label())
            .collect();
        assert_eq!(kinds, vec!["drone", "rush_path"]);
        let rush = loadout.slots[1].as_ref().unwrap();
        assert_eq!(rush.duration_secs, Some(8.0), "Growth plus lifetime");
        assert_eq!(LoadoutId::from_name("frostbite"), Some(LoadoutId::Frostbite));
    }

    #[test]
    fn test_loadout_parse_error() {
        let err = Loadout::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "Got {err:?}");
    }

    #[test]
    fn test_loadout_missing_file() {
        let err = Loadout::from_path(std::path::Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "Got {err:?}");
    }

    #[test]
    fn test_reentry_policies() {
        assert_eq!(AbilityDescriptor::charge().reentry(), ReentryPolicy::Toggle);
        assert_eq!(AbilityDescriptor::boosters().reentry(), ReentryPolicy::Toggle);
        assert_eq!(
            AbilityDescriptor::jagged_blade().reentry(),
            ReentryPolicy::Toggle
        );
        assert_eq!(AbilityDescriptor::deadeye().reentry(), ReentryPolicy::Reject);
        assert_eq!(AbilityDescriptor::dash().reentry(), ReentryPolicy::Reject);
        assert_eq!(AbilityDescriptor::rewind().reentry(), ReentryPolicy::Reject);
        assert_eq!(AbilityDescriptor::snow_drone().reentry(), ReentryPolicy::Reject);
        assert_eq!(AbilityDescriptor::rush_path().reentry(), ReentryPolicy::Reject);
    }

    // ---- Agent parameters ----

    #[test]
    fn test_agent_params_get_set() {
        let mut params = AgentParams::default();
        assert_eq!(
            params.get(OverrideKind::Gravity),
            Some(ParamValue::Gravity(crate::constants::DEFAULT_GRAVITY))
        );
        assert_eq!(params.get(OverrideKind::Transform), None);

        params.set(ParamValue::MovementController(false));
        params.set(ParamValue::Camera(CameraRig::Charge));
        assert!(!params.controller_enabled);
        assert_eq!(params.camera, CameraRig::Charge);
        assert_eq!(
            ParamValue::FieldOfView(30.0).kind(),
            OverrideKind::FieldOfView
        );
    }

    // ---- Damage ----

    #[test]
    fn test_vitals_clamp_and_death() {
        let mut vitals = Vitals {
            health: 100.0,
            max_health: 100.0,
        };
        vitals.take_damage(40.0);
        assert_eq!(vitals.health(), 60.0);
        vitals.take_damage(500.0);
        assert_eq!(vitals.health(), 0.0, "Health should clamp at zero");
        assert!(vitals.is_dead());

        // Dead targets ignore further damage, including negative amounts.
        vitals.take_damage(-50.0);
        assert_eq!(vitals.health(), 0.0);
    }

    // ---- Geometry ----

    #[test]
    fn test_transform_axes() {
        let t = Transform::new(
            DVec3::ZERO,
            DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2),
        );
        let f = t.forward();
        assert!((f - DVec3::X).length() < 1e-9, "Yaw +90° should face +X, got {f}");

        let level = Transform::default();
        assert!((level.angle_to(DVec3::new(0.0, 0.0, 10.0))).abs() < 1e-9);
        assert!((level.angle_to(DVec3::new(10.0, 0.0, 10.0)) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_forward_ignores_pitch() {
        let t = Transform::new(DVec3::ZERO, DQuat::from_rotation_x(-0.5));
        let flat = t.flat_forward();
        assert!(flat.y.abs() < 1e-12);
        assert!((flat.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_layer_mask() {
        assert!(LayerMask::SOLID.contains(LayerMask::OBSTACLE));
        assert!(!LayerMask::SOLID.contains(LayerMask::ENEMY));
        assert!(LayerMask::ENEMY
            .union(LayerMask::AGENT)
            .contains(LayerMask::AGENT));
    }

    // ---- Wire format ----

    #[test]
    fn test_command_tagged_format() {
        let cmd = AbilityCommand::Activate {
            agent: EntityId(7),
            slot: 1,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""type":"Activate""#), "Got {json}");
        let back: AbilityCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent(), Some(EntityId(7)));
    }

    #[test]
    fn test_phase_helpers() {
        assert!(AbilityPhase::Arming.is_running());
        assert!(!AbilityPhase::Idle.is_running());
        assert!(AbilityPhase::Completed.is_ending());
        assert!(EndReason::Forced.is_interrupt());
        assert!(!EndReason::Toggled.is_interrupt());
    }
}
