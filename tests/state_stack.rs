//! State machine behavior through the public API.
use glam::{Mat4, Vec3};

use brick_renderer::renderer::{RenderError, RenderState, StackKind};
use brick_renderer::scene::{ColorPair, TransformMode};
use brick_renderer::settings::{RenderSettings, StackDepths};

fn shade(i: usize) -> ColorPair {
    let v = i as f32 / 64.0;
    ColorPair::rgb(v, 1.0 - v, 0.5)
}

#[test]
fn sixty_five_color_pushes_overflow_and_keep_the_first_sixty_four() {
    let mut state = RenderState::new(&StackDepths::default(), ColorPair::rgb(0.5, 0.5, 0.5));
    for i in 0..64 {
        state.push_color(shade(i)).unwrap();
    }

    let err = state.push_color(ColorPair::rgb(1.0, 0.0, 0.0)).unwrap_err();
    assert_eq!(
        err,
        RenderError::StackOverflow {
            stack: StackKind::Color,
            depth: 64
        }
    );
    assert_eq!(state.color(), shade(63));

    for i in (0..64).rev() {
        assert_eq!(state.pop_color().unwrap(), shade(i));
    }
    assert_eq!(state.color(), ColorPair::rgb(0.5, 0.5, 0.5));
    assert!(matches!(
        state.pop_color(),
        Err(RenderError::StackUnderflow {
            stack: StackKind::Color
        })
    ));
}

#[test]
fn balanced_push_pop_sequences_restore_the_base_state() {
    let settings = RenderSettings::default();
    let mut state = RenderState::new(&settings.stack_depths, settings.default_colors());
    let before = state.snapshot();

    state
        .push_transform(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), TransformMode::Multiply)
        .unwrap();
    state.push_color(ColorPair::rgb(0.1, 0.2, 0.3)).unwrap();
    state
        .push_transform(Mat4::from_rotation_y(0.7), TransformMode::Multiply)
        .unwrap();
    state.push_wireframe();
    state.pop_wireframe().unwrap();
    state.pop_transform().unwrap();
    state.pop_color().unwrap();
    state.pop_transform().unwrap();

    assert_eq!(state.snapshot(), before);
    assert!(state.is_balanced());
}

#[test]
fn configured_depths_are_honoured() {
    let depths = StackDepths {
        transform: 2,
        ..StackDepths::default()
    };
    let mut state = RenderState::new(&depths, ColorPair::rgb(0.5, 0.5, 0.5));
    state.push_transform(Mat4::IDENTITY, TransformMode::Multiply).unwrap();
    state.push_transform(Mat4::IDENTITY, TransformMode::Multiply).unwrap();
    assert!(matches!(
        state.push_transform(Mat4::IDENTITY, TransformMode::Multiply),
        Err(RenderError::StackOverflow {
            stack: StackKind::Transform,
            depth: 2
        })
    ));
}
