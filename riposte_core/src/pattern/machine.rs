//! PatternMachine - IDLE → TELEGRAPH → ATTACK → RETURN → (TELEGRAPH | DONE)
//!
//! One machine lives on every monster. The combat engine steps exactly one of
//! them per tick while it is the monsters' turn. Each call performs at most one
//! phase transition; a phase's timer restarts from zero when it is entered.

use super::{ease_in_quad, ease_out_quad, AttackPhase, AttackScript, AttackStep, Position, ThreatSignal};
use crate::config::TimingConstants;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A strike that reached its resolution point this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    pub script: String,
    pub step_index: usize,
    pub step: AttackStep,
    /// Whether the unparriable warning was raised during the telegraph
    pub signaled: bool,
}

/// What a single `tick` produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSignal {
    pub strike: Option<Strike>,
    /// The machine reached `Done` (or had nothing to do)
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMachine {
    phase: AttackPhase,
    phase_timer: f64,
    idle_timer: f64,
    script_index: Option<usize>,
    step_index: usize,
    hit_triggered: bool,
    threat: ThreatSignal,
    position: Position,
    home: Position,
    attack_start: Position,
    return_from: Position,
    lunge_dir: (f64, f64),
}

impl PatternMachine {
    pub fn new(home: Position) -> Self {
        PatternMachine {
            phase: AttackPhase::Idle,
            phase_timer: 0.0,
            idle_timer: 0.0,
            script_index: None,
            step_index: 0,
            hit_triggered: false,
            threat: ThreatSignal::None,
            position: home,
            home,
            attack_start: home,
            return_from: home,
            lunge_dir: (0.0, 0.0),
        }
    }

    /// Prepare for a new monster turn. The script is picked when idling ends.
    pub fn begin_turn(&mut self) {
        self.phase = AttackPhase::Idle;
        self.phase_timer = 0.0;
        self.idle_timer = 0.0;
        self.script_index = None;
        self.step_index = 0;
        self.hit_triggered = false;
        self.threat = ThreatSignal::None;
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn threat(&self) -> ThreatSignal {
        self.threat
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn home(&self) -> Position {
        self.home
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn script_index(&self) -> Option<usize> {
        self.script_index
    }

    pub fn is_done(&self) -> bool {
        self.phase == AttackPhase::Done
    }

    /// Advance by `dt` ticks
    pub fn tick(
        &mut self,
        dt: f64,
        scripts: &[AttackScript],
        target: Position,
        timing: &TimingConstants,
        rng: &mut impl Rng,
    ) -> TickSignal {
        let mut signal = TickSignal::default();
        let dt = dt.max(0.0);

        match self.phase {
            AttackPhase::Idle => {
                self.idle_timer += dt;
                if self.idle_timer >= timing.idle_threshold {
                    if scripts.is_empty() {
                        tracing::warn!("monster has no attack scripts, skipping its turn");
                        self.phase = AttackPhase::Done;
                        signal.done = true;
                        return signal;
                    }
                    let index = rng.gen_range(0..scripts.len());
                    self.script_index = Some(index);
                    self.step_index = 0;
                    self.home = self.position;
                    self.lunge_dir = self.home.direction_to(target);
                    self.enter(AttackPhase::Telegraph);
                    tracing::debug!(script = %scripts[index].name, "telegraph started");
                }
            }
            AttackPhase::Telegraph => {
                let Some(step) = self.current_step(scripts) else {
                    return self.abort();
                };
                self.phase_timer += dt;
                let progress = self.phase_timer / step.duration;
                self.threat = if step.unparriable && progress > timing.telegraph_warning_ratio {
                    ThreatSignal::Unparriable
                } else {
                    ThreatSignal::Telegraph
                };
                if self.phase_timer >= step.duration {
                    self.attack_start = self.position;
                    self.hit_triggered = false;
                    self.enter(AttackPhase::Attack);
                }
            }
            AttackPhase::Attack => {
                let Some(step) = self.current_step(scripts).cloned() else {
                    return self.abort();
                };
                self.phase_timer += dt;
                let t = self.phase_timer / timing.attack_duration;
                self.position = self
                    .attack_start
                    .offset(self.lunge_dir, timing.attack_distance * ease_in_quad(t));

                let hit_at = timing.attack_duration - timing.hit_offset;
                let finished = self.phase_timer >= timing.attack_duration;
                if !self.hit_triggered && (self.phase_timer >= hit_at || finished) {
                    self.hit_triggered = true;
                    signal.strike = Some(Strike {
                        script: self.script_name(scripts),
                        step_index: self.step_index,
                        signaled: self.threat == ThreatSignal::Unparriable,
                        step,
                    });
                }
                if finished {
                    self.return_from = self.position;
                    self.threat = ThreatSignal::None;
                    self.enter(AttackPhase::Return);
                }
            }
            AttackPhase::Return => {
                let steps = self.script_len(scripts);
                let last = self.step_index + 1 >= steps;
                let (duration, dest) = if last {
                    (timing.return_home_duration, self.home)
                } else {
                    let mid = self
                        .home
                        .offset(self.lunge_dir, timing.attack_distance * 0.5);
                    (timing.return_mid_duration, mid)
                };
                self.phase_timer += dt;
                let t = self.phase_timer / duration;
                self.position = self.return_from.lerp(dest, ease_out_quad(t));

                if self.phase_timer >= duration {
                    self.position = dest;
                    if last {
                        self.enter(AttackPhase::Done);
                        signal.done = true;
                    } else {
                        self.step_index += 1;
                        self.enter(AttackPhase::Telegraph);
                    }
                }
            }
            AttackPhase::Done => {
                signal.done = true;
            }
        }

        signal
    }

    fn enter(&mut self, phase: AttackPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "pattern phase");
        self.phase = phase;
        self.phase_timer = 0.0;
    }

    fn abort(&mut self) -> TickSignal {
        tracing::warn!("pattern lost its script mid-turn, ending the turn");
        self.position = self.home;
        self.threat = ThreatSignal::None;
        self.phase = AttackPhase::Done;
        TickSignal {
            strike: None,
            done: true,
        }
    }

    fn current_step<'a>(&self, scripts: &'a [AttackScript]) -> Option<&'a AttackStep> {
        scripts
            .get(self.script_index?)
            .and_then(|s| s.steps.get(self.step_index))
    }

    fn script_len(&self, scripts: &[AttackScript]) -> usize {
        self.script_index
            .and_then(|i| scripts.get(i))
            .map(|s| s.steps.len())
            .unwrap_or(0)
    }

    fn script_name(&self, scripts: &[AttackScript]) -> String {
        self.script_index
            .and_then(|i| scripts.get(i))
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_step() -> Vec<AttackScript> {
        vec![AttackScript::new(
            "one-two",
            vec![
                AttackStep::new(20.0, 1.0, false),
                AttackStep::new(30.0, 1.5, true),
            ],
        )]
    }

    fn run_to_done(
        machine: &mut PatternMachine,
        scripts: &[AttackScript],
        dt: f64,
    ) -> (Vec<Strike>, Vec<AttackPhase>) {
        let timing = TimingConstants::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let target = Position::new(0.0, 0.0);
        let mut strikes = Vec::new();
        let mut phases = vec![machine.phase()];
        for _ in 0..10_000 {
            let signal = machine.tick(dt, scripts, target, &timing, &mut rng);
            if let Some(strike) = signal.strike {
                strikes.push(strike);
            }
            if phases.last() != Some(&machine.phase()) {
                phases.push(machine.phase());
            }
            if signal.done {
                break;
            }
        }
        (strikes, phases)
    }

    #[test]
    fn test_full_script_phase_order() {
        let scripts = two_step();
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        let (strikes, phases) = run_to_done(&mut machine, &scripts, 1.0);

        assert_eq!(strikes.len(), 2);
        assert_eq!(strikes[0].step_index, 0);
        assert_eq!(strikes[1].step_index, 1);
        assert_eq!(
            phases,
            vec![
                AttackPhase::Idle,
                AttackPhase::Telegraph,
                AttackPhase::Attack,
                AttackPhase::Return,
                AttackPhase::Telegraph,
                AttackPhase::Attack,
                AttackPhase::Return,
                AttackPhase::Done,
            ]
        );
        assert!(machine.is_done());
        // Back home after the last step
        assert!(machine.position().distance(Position::new(240.0, 0.0)) < 1e-9);
    }

    #[test]
    fn test_strike_fires_once_per_step_with_coarse_dt() {
        let scripts = two_step();
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        // dt larger than the whole attack phase still yields exactly one strike per step
        let (strikes, _) = run_to_done(&mut machine, &scripts, 25.0);
        assert_eq!(strikes.len(), 2);
    }

    #[test]
    fn test_strike_timing() {
        let timing = TimingConstants::default();
        let scripts = vec![AttackScript::new("tap", vec![AttackStep::new(10.0, 1.0, false)])];
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let target = Position::new(0.0, 0.0);

        // Idle (30) + telegraph (10)
        for _ in 0..40 {
            let s = machine.tick(1.0, &scripts, target, &timing, &mut rng);
            assert!(s.strike.is_none());
        }
        assert_eq!(machine.phase(), AttackPhase::Attack);

        let mut fired_at = None;
        for i in 1..=12 {
            let s = machine.tick(1.0, &scripts, target, &timing, &mut rng);
            if s.strike.is_some() {
                assert!(fired_at.is_none());
                fired_at = Some(i);
            }
        }
        // attack_duration 12 - hit_offset 2
        assert_eq!(fired_at, Some(10));
        assert_eq!(machine.phase(), AttackPhase::Return);
    }

    #[test]
    fn test_unparriable_signal_after_warning_ratio() {
        let timing = TimingConstants::default();
        let scripts = vec![AttackScript::new("slam", vec![AttackStep::new(10.0, 2.0, true)])];
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let target = Position::new(0.0, 0.0);

        for _ in 0..30 {
            machine.tick(1.0, &scripts, target, &timing, &mut rng);
        }
        assert_eq!(machine.phase(), AttackPhase::Telegraph);

        let mut signals = Vec::new();
        for _ in 0..9 {
            machine.tick(1.0, &scripts, target, &timing, &mut rng);
            signals.push(machine.threat());
        }
        // progress 0.1..0.8 → plain telegraph, 0.9 → unparriable
        assert!(signals[..8].iter().all(|s| *s == ThreatSignal::Telegraph));
        assert_eq!(signals[8], ThreatSignal::Unparriable);

        let mut strike = None;
        for _ in 0..20 {
            let s = machine.tick(1.0, &scripts, target, &timing, &mut rng);
            if s.strike.is_some() {
                strike = s.strike;
            }
        }
        let strike = strike.unwrap();
        assert!(strike.signaled);
        assert!(strike.step.unparriable);
    }

    #[test]
    fn test_attack_moves_toward_target() {
        let timing = TimingConstants::default();
        let scripts = vec![AttackScript::new("tap", vec![AttackStep::new(1.0, 1.0, false)])];
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let target = Position::new(0.0, 0.0);

        while machine.phase() != AttackPhase::Return {
            machine.tick(1.0, &scripts, target, &timing, &mut rng);
        }
        let reached = machine.position();
        assert!((reached.x - (240.0 - timing.attack_distance)).abs() < 1e-9);
    }

    #[test]
    fn test_begin_turn_resets_step() {
        let scripts = two_step();
        let mut machine = PatternMachine::new(Position::new(240.0, 0.0));
        run_to_done(&mut machine, &scripts, 1.0);
        assert_eq!(machine.step_index(), 1);

        machine.begin_turn();
        assert_eq!(machine.phase(), AttackPhase::Idle);
        assert_eq!(machine.step_index(), 0);
        assert!(machine.script_index().is_none());
    }

    #[test]
    fn test_no_scripts_finishes_immediately() {
        let timing = TimingConstants::default();
        let mut machine = PatternMachine::new(Position::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let signal = machine.tick(100.0, &[], Position::new(1.0, 0.0), &timing, &mut rng);
        assert!(signal.done);
        assert!(signal.strike.is_none());
    }
}
