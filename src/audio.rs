//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects, no external files.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Balloon bursts
    Pop,
    /// Gravity switched on
    GravityOn,
    /// Gravity switched off
    GravityOff,
}

pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn play(&self, effect: SoundEffect) {
        if self.muted || self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Pop => self.play_pop(ctx, self.volume),
            SoundEffect::GravityOn => self.play_sweep(ctx, self.volume, 220.0, 520.0),
            SoundEffect::GravityOff => self.play_sweep(ctx, self.volume, 520.0, 220.0),
        }
    }

    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short bang with a bright snap on top
    fn play_pop(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.12)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 2200.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.04)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.05).ok();
        }
    }

    /// Soft glide between two pitches
    fn play_sweep(&self, ctx: &AudioContext, vol: f32, from: f32, to: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, from, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.25)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }
}
