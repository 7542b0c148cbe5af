//! TypeScript Generation Tests
//!
//! Validates that UI-facing value types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn ui_types_implement_specta_type() {
    use specta::Type;

    fn assert_type<T: Type>() {}

    // Frames shown on the dashboard
    assert_type::<roverlink::ControlFrame>();
    assert_type::<roverlink::ControlInput>();
    assert_type::<roverlink::TelemetryFrame>();
    assert_type::<roverlink::FunctionBits>();

    // Session status
    assert_type::<roverlink::SessionPhase>();
    assert_type::<roverlink::Role>();
    assert_type::<roverlink::FrameKind>();
    assert_type::<roverlink::UpdateRate>();

    // Device list
    assert_type::<roverlink::VehicleRecord>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn tauri_feature_disabled() {
    // Without the feature the same types still build, just without specta.
    let _ = roverlink::UpdateRate::Native;
    let _ = roverlink::SessionPhase::Idle;
}
