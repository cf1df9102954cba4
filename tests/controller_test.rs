use explore_ngin::{
    ElementState, KeyCode, MouseButton,
    config::{ControllerConfig, InputCode},
    controller::{Controller, InputResponse, Intent},
    flow::input_code,
};

#[test]
fn intents_follow_down_and_up_events() {
    let mut controller = Controller::new(ControllerConfig::default());

    assert_eq!(
        controller.on_input(InputCode::Key(KeyCode::KeyW), true),
        InputResponse::Handled
    );
    assert!(controller.is_active(Intent::Forward));
    controller.on_input(InputCode::Key(KeyCode::ArrowLeft), true);
    assert!(controller.is_active(Intent::Left));

    controller.on_input(InputCode::Key(KeyCode::KeyW), false);
    assert!(!controller.is_active(Intent::Forward));
    assert!(controller.is_active(Intent::Left));
    assert!(!controller.is_active(Intent::Backward));
    assert!(!controller.is_active(Intent::Right));
}

#[test]
fn unbound_inputs_are_ignored() {
    let mut controller = Controller::new(ControllerConfig::default());
    assert_eq!(
        controller.on_input(InputCode::Key(KeyCode::KeyQ), true),
        InputResponse::Ignored
    );
    assert_eq!(
        controller.on_input(InputCode::Mouse(MouseButton::Right), true),
        InputResponse::Ignored
    );
    assert!([Intent::Forward, Intent::Backward, Intent::Left, Intent::Right]
        .into_iter()
        .all(|intent| !controller.is_active(intent)));
}

#[test]
fn explore_is_held_and_interact_fires_on_press() {
    let mut controller = Controller::new(ControllerConfig::default());

    controller.on_input(InputCode::Mouse(MouseButton::Left), true);
    assert!(controller.is_exploring());
    controller.on_input(InputCode::Mouse(MouseButton::Left), false);
    assert!(!controller.is_exploring());

    assert_eq!(
        controller.on_input(InputCode::Key(KeyCode::Space), true),
        InputResponse::Interact
    );
    assert_eq!(
        controller.on_input(InputCode::Key(KeyCode::Space), false),
        InputResponse::Ignored
    );
}

#[test]
fn custom_bindings_replace_the_defaults() {
    let config = ControllerConfig {
        forward: vec![InputCode::Key(KeyCode::KeyI)],
        ..Default::default()
    };
    let mut controller = Controller::new(config);
    assert_eq!(
        controller.on_input(InputCode::Key(KeyCode::KeyW), true),
        InputResponse::Ignored
    );
    controller.on_input(InputCode::Key(KeyCode::KeyI), true);
    assert!(controller.is_active(Intent::Forward));
}

#[test]
fn mouse_window_events_are_normalized() {
    // keyboard events carry platform data and can't be built outside winit
    let event = winit::event::WindowEvent::MouseInput {
        device_id: unsafe { winit::event::DeviceId::dummy() },
        state: ElementState::Pressed,
        button: MouseButton::Left,
    };
    assert_eq!(input_code(&event), Some((InputCode::Mouse(MouseButton::Left), true)));
    assert_eq!(input_code(&winit::event::WindowEvent::Focused(true)), None);
}
