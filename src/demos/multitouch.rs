use std::collections::VecDeque;

use glam::DVec2;

use crate::model::SettingsState;
use crate::utils::{Random, TWO_PI};

pub const MAX_PARTICLES: usize = 280;
pub const COLOURS: [&str; 7] = ["#69D2E7", "#A7DBD8", "#E0E4CC", "#F38630", "#FA6900", "#FF4E50", "#F9D423"];

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    /// Heading, nudged every step
    pub theta: f64,
    pub wander: f64,
    pub drag: f64,
    pub colour: &'static str,
    pub alive: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: DVec2::ZERO,
            vel: DVec2::ZERO,
            radius: 10.0,
            theta: 0.0,
            wander: 0.15,
            drag: 0.92,
            colour: "#fff",
            alive: true,
        }
    }
}

impl Particle {
    /// Euler step: move, apply drag, wander, shrink
    pub fn step(&mut self, decay: f64, random: &mut Random) {
        self.pos += self.vel;
        self.vel *= self.drag;

        self.theta += random.between(-0.5, 0.5) * self.wander;
        self.vel += DVec2::new(self.theta.sin(), self.theta.cos()) * 0.1;

        self.radius *= decay;
        self.alive = self.radius > 0.5;
    }
}

/// Spawn parameters read from the demo's settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub max_size: f64,
    pub energy: f64,
    pub force: f64,
    pub decay: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_size: 40.0,
            energy: 0.9,
            force: 5.0,
            decay: 0.96,
        }
    }
}

impl Tuning {
    pub fn from_settings(state: &SettingsState) -> Self {
        let defaults = Self::default();
        Self {
            max_size: state.number("maxSize").unwrap_or(defaults.max_size),
            energy: state.number("energy").unwrap_or(defaults.energy),
            force: state.number("force").unwrap_or(defaults.force),
            decay: state.number("decay").unwrap_or(defaults.decay),
        }
    }
}

/// Live particles, oldest first, plus a pool of dead ones for reuse
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    pool: Vec<Particle>,
    random: Random,
}

impl ParticleSystem {
    pub fn new(random: Random) -> Self {
        Self {
            particles: VecDeque::with_capacity(MAX_PARTICLES),
            pool: Vec::new(),
            random,
        }
    }

    /// Adds a particle at `pos`, recycling the oldest one when full
    pub fn spawn(&mut self, pos: DVec2, tuning: &Tuning) {
        if self.particles.len() >= MAX_PARTICLES {
            if let Some(oldest) = self.particles.pop_front() {
                self.pool.push(oldest);
            }
        }

        let mut particle = self.pool.pop().unwrap_or_default();
        let random = &mut self.random;
        particle.pos = pos;
        particle.radius = random.between(2.0, tuning.max_size);
        particle.theta = random.next_f64() * TWO_PI;
        particle.wander = random.between(0.5, 2.0);
        particle.colour = random.pick(&COLOURS).copied().unwrap_or(COLOURS[0]);
        particle.drag = random.between(tuning.energy, 0.99);
        particle.alive = true;

        let heading = random.next_f64() * TWO_PI;
        let force = random.between(2.0, tuning.force);
        particle.vel = DVec2::new(heading.sin(), heading.cos()) * force;

        self.particles.push_back(particle);
    }

    /// Steps and draws the living particles, newest first, and pools the dead
    pub fn update(&mut self, decay: f64, mut draw: impl FnMut(&Particle)) {
        for i in (0..self.particles.len()).rev() {
            if self.particles[i].alive {
                let particle = &mut self.particles[i];
                particle.step(decay, &mut self.random);
                draw(particle);
            } else if let Some(dead) = self.particles.remove(i) {
                self.pool.push(dead);
            }
        }
    }

    pub fn random(&mut self) -> &mut Random {
        &mut self.random
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::run;

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec2;

    use super::{ParticleSystem, Tuning};
    use crate::error::{Result, SandpitError};
    use crate::model::{SettingDescriptor, SettingDescriptors};
    use crate::sandpit::Sandpit;
    use crate::utils::TWO_PI;
    use crate::view::{Container, SurfaceKind};

    fn descriptors() -> SettingDescriptors {
        SettingDescriptors::new()
            .add("demo", SettingDescriptor::text("multitouch").editable(false).sticky(true))
            .add("maxSize", SettingDescriptor::number(40.0).min(5.0).max(50.0).step(1.0))
            .add("energy", SettingDescriptor::number(0.9).min(0.0).max(0.9).step(0.1))
            .add("force", SettingDescriptor::number(5.0).min(2.0).max(30.0).step(1.0))
            .add("decay", SettingDescriptor::number(0.96).min(0.90).max(0.99).step(0.01))
            .add("blend", SettingDescriptor::list(["multiply", "lighter", "overlay"]))
    }

    /// Particles that burst from every touch
    pub fn run(container: impl Into<Container>) -> Result<Sandpit> {
        let sandpit = Sandpit::with_kind(container, SurfaceKind::Canvas)?;
        sandpit.settings(descriptors(), true)?;
        sandpit.auto_clear(true);

        let ctx = sandpit
            .context()
            .as_2d()
            .cloned()
            .ok_or_else(|| SandpitError::ContextUnavailable("2d".into()))?;
        let system = Rc::new(RefCell::new(ParticleSystem::new(sandpit.random(None))));

        {
            let handle = sandpit.downgrade();
            let system = system.clone();
            sandpit.on_setup(move || {
                let Some(sandpit) = handle.upgrade() else {
                    return;
                };
                let tuning = Tuning::from_settings(&sandpit.settings_state());
                let centre = DVec2::new(sandpit.width() as f64, sandpit.height() as f64) / 2.0;
                let mut system = system.borrow_mut();
                for _ in 0..20 {
                    let offset = DVec2::new(system.random().between(-100.0, 100.0), system.random().between(-100.0, 100.0));
                    system.spawn(centre + offset, &tuning);
                }
            });
        }

        {
            let handle = sandpit.downgrade();
            let system = system.clone();
            sandpit.on_loop(move || {
                let Some(sandpit) = handle.upgrade() else {
                    return;
                };
                let state = sandpit.settings_state();
                let blend = state.text("blend").unwrap_or("multiply");
                if let Err(err) = ctx.set_global_composite_operation(blend) {
                    tracing::warn!("blend `{blend}` rejected: {}", SandpitError::from(err));
                }
                let decay = Tuning::from_settings(&state).decay;
                system.borrow_mut().update(decay, |particle| {
                    ctx.begin_path();
                    if ctx.arc(particle.pos.x, particle.pos.y, particle.radius, 0.0, TWO_PI).is_ok() {
                        ctx.set_fill_style_str(particle.colour);
                        ctx.fill();
                    }
                });
            });
        }

        {
            let handle = sandpit.downgrade();
            sandpit.on_move(move |_event| {
                let Some(sandpit) = handle.upgrade() else {
                    return;
                };
                let tuning = Tuning::from_settings(&sandpit.settings_state());
                let mut system = system.borrow_mut();
                for touch in sandpit.input().touches() {
                    let count = system.random().between(1.0, 4.0) as usize;
                    for _ in 0..count {
                        system.spawn(DVec2::new(touch.x, touch.y), &tuning);
                    }
                }
            });
        }

        sandpit.start();
        Ok(sandpit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SettingDescriptor, SettingDescriptors};

    fn system() -> ParticleSystem {
        ParticleSystem::new(Random::from_seed(42))
    }

    #[test]
    fn test_spawn_uses_tuning() {
        let mut system = system();
        let tuning = Tuning {
            max_size: 10.0,
            energy: 0.5,
            force: 3.0,
            decay: 0.96,
        };
        for _ in 0..100 {
            system.spawn(DVec2::new(50.0, 60.0), &tuning);
        }
        for p in system.iter() {
            assert_eq!(p.pos, DVec2::new(50.0, 60.0));
            assert!((2.0..10.0).contains(&p.radius));
            assert!((0.5..0.99).contains(&p.drag));
            assert!((0.5..2.0).contains(&p.wander));
            assert!(p.vel.length() < 3.0);
            assert!(COLOURS.contains(&p.colour));
            assert!(p.alive);
        }
    }

    #[test]
    fn test_capacity_recycles_oldest() {
        let mut system = system();
        let tuning = Tuning::default();
        for i in 0..MAX_PARTICLES + 20 {
            system.spawn(DVec2::new(i as f64, 0.0), &tuning);
        }
        assert_eq!(system.len(), MAX_PARTICLES);
        // the first 20 were pushed out
        assert_eq!(system.iter().next().map(|p| p.pos.x), Some(20.0));
    }

    #[test]
    fn test_particles_decay_into_the_pool() {
        let mut system = system();
        let tuning = Tuning::default();
        for _ in 0..20 {
            system.spawn(DVec2::ZERO, &tuning);
        }

        let mut drawn = 0;
        system.update(0.96, |_| drawn += 1);
        assert_eq!(drawn, 20);

        // 40 * 0.5^7 < 0.5: dead after seven halvings, pooled on the next pass
        for _ in 0..8 {
            system.update(0.5, |_| {});
        }
        assert!(system.is_empty());
        assert_eq!(system.pooled(), 20);

        // pooled particles come back to life
        system.spawn(DVec2::ZERO, &tuning);
        assert_eq!(system.pooled(), 19);
        assert!(system.iter().all(|p| p.alive));
    }

    #[test]
    fn test_step_moves_and_shrinks() {
        let mut random = Random::from_seed(3);
        let mut p = Particle {
            vel: DVec2::new(2.0, 0.0),
            radius: 1.0,
            ..Particle::default()
        };
        p.step(0.6, &mut random);
        assert_eq!(p.pos, DVec2::new(2.0, 0.0));
        assert!((p.radius - 0.6).abs() < 1e-12);
        assert!(p.alive);
        p.step(0.6, &mut random);
        assert!(!p.alive);
    }

    #[test]
    fn test_tuning_from_settings() {
        let descriptors = SettingDescriptors::new()
            .add("maxSize", SettingDescriptor::number(12.0))
            .add("force", SettingDescriptor::number(20.0));
        let tuning = Tuning::from_settings(&descriptors.resolve(None).unwrap());
        assert_eq!(tuning.max_size, 12.0);
        assert_eq!(tuning.force, 20.0);
        assert_eq!(tuning.energy, Tuning::default().energy);
    }
}
