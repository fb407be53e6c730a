//! Persisted world state.
//!
//! Particles are stored densely in slot order; constraints and groups refer to
//! them by position in that list rather than by handle, so a snapshot is
//! independent of arena generations. Restoring yields fresh handles with the
//! same particle order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arena::{ArenaId, ParticleId};
use crate::cloth::Cloth;
use crate::config::WorldConfig;
use crate::constraint::{Constraint, DistanceConstraint, PinConstraint};
use crate::error::{PhysicsError, SnapshotError};
use crate::float::Float;
use crate::group::Group;
use crate::particle::Particle;
use crate::rigid::RigidBody;
use crate::spring::SpringConstraint;
use crate::vec::Vec2;
use crate::world::World;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ParticleRecord<F: Float = f64> {
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    pub radius: F,
    pub mass: F,
    pub fixed: bool,
}

/// A distance link between two particle indices. Also used for cloth links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LinkRecord<F: Float = f64> {
    pub a: usize,
    pub b: usize,
    pub rest_distance: F,
    pub stiffness: F,
    pub compliance: F,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintRecord<F: Float = f64> {
    Distance(LinkRecord<F>),
    Pin {
        particle: usize,
        anchor: Vec2<F>,
    },
    Spring {
        a: usize,
        b: usize,
        rest_length: F,
        stiffness: F,
        damping: Option<F>,
        max_force: F,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupRecord<F: Float = f64> {
    Cloth {
        cols: usize,
        rows: usize,
        /// Row-major; `None` where the particle was removed.
        particles: Vec<Option<usize>>,
        tear_factor: F,
        /// Links that have not torn.
        links: Vec<LinkRecord<F>>,
    },
    RigidBody {
        particles: Vec<usize>,
        rest_offsets: Vec<Vec2<F>>,
        stiffness: F,
        fixed: bool,
    },
}

/// Everything needed to rebuild an equivalent [`World`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct WorldSnapshot<F: Float = f64> {
    pub config: WorldConfig<F>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub frame: u64,
    pub particles: Vec<ParticleRecord<F>>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord<F>>,
    #[serde(default)]
    pub groups: Vec<GroupRecord<F>>,
}

/// Slot index to dense index.
struct DenseIndex(Vec<Option<usize>>);

impl DenseIndex {
    fn get(&self, id: ParticleId) -> Option<usize> {
        self.0.get(id.index() as usize).copied().flatten()
    }

    fn link<F: Float>(&self, c: &DistanceConstraint<F>) -> Option<LinkRecord<F>> {
        Some(LinkRecord {
            a: self.get(c.a)?,
            b: self.get(c.b)?,
            rest_distance: c.rest_distance,
            stiffness: c.stiffness,
            compliance: c.compliance,
        })
    }
}

fn resolve_index(ids: &[ParticleId], index: usize) -> Result<ParticleId, SnapshotError> {
    ids.get(index)
        .copied()
        .ok_or(SnapshotError::IndexOutOfRange { index, count: ids.len() })
}

fn rebuild_link<F: Float>(ids: &[ParticleId], r: &LinkRecord<F>) -> Result<DistanceConstraint<F>, SnapshotError> {
    Ok(DistanceConstraint::new(resolve_index(ids, r.a)?, resolve_index(ids, r.b)?, r.rest_distance)
        .with_stiffness(r.stiffness)
        .with_compliance(r.compliance))
}

impl<F: Float> WorldSnapshot<F> {
    pub fn capture(world: &World<F>) -> Self {
        let mut slots = Vec::new();
        let mut particles = Vec::with_capacity(world.particle_count());
        for (id, p) in world.particles() {
            let slot = id.index() as usize;
            if slots.len() <= slot {
                slots.resize(slot + 1, None);
            }
            slots[slot] = Some(particles.len());
            particles.push(ParticleRecord {
                position: p.pos,
                velocity: p.vel,
                radius: p.radius,
                mass: p.mass(),
                fixed: p.is_fixed(),
            });
        }
        let index = DenseIndex(slots);

        let constraints = world
            .constraints()
            .filter_map(|(_, c)| match c {
                Constraint::Distance(d) => index.link(d).map(ConstraintRecord::Distance),
                Constraint::Pin(pin) => Some(ConstraintRecord::Pin {
                    particle: index.get(pin.particle)?,
                    anchor: pin.anchor,
                }),
                Constraint::Spring(s) => Some(ConstraintRecord::Spring {
                    a: index.get(s.a)?,
                    b: index.get(s.b)?,
                    rest_length: s.rest_length,
                    stiffness: s.stiffness,
                    damping: s.damping,
                    max_force: s.max_force,
                }),
            })
            .collect();

        let groups = world
            .groups()
            .map(|(_, g)| match g {
                Group::Cloth(cloth) => GroupRecord::Cloth {
                    cols: cloth.cols(),
                    rows: cloth.rows(),
                    particles: cloth.cells().iter().map(|cell| cell.and_then(|id| index.get(id))).collect(),
                    tear_factor: cloth.tear_factor(),
                    links: cloth.constraints().iter().filter_map(|c| index.link(c)).collect(),
                },
                Group::RigidBody(body) => {
                    let (particles, rest_offsets) = body
                        .particles()
                        .iter()
                        .zip(body.rest_offsets())
                        .filter_map(|(&id, &r)| Some((index.get(id)?, r)))
                        .unzip();
                    GroupRecord::RigidBody {
                        particles,
                        rest_offsets,
                        stiffness: body.stiffness,
                        fixed: body.fixed,
                    }
                }
            })
            .collect();

        WorldSnapshot {
            config: world.config().clone(),
            paused: world.is_paused(),
            frame: world.frame(),
            particles,
            constraints,
            groups,
        }
    }

    /// Rebuild a world, validating every record.
    pub fn restore(&self) -> Result<World<F>, SnapshotError> {
        let mut world = World::new(self.config.clone());
        world.set_paused(self.paused);
        world.set_frame(self.frame);

        let mut ids = Vec::with_capacity(self.particles.len());
        for r in &self.particles {
            let p = Particle::try_new(r.position, r.radius, r.mass, r.fixed)?;
            if !r.velocity.is_finite() {
                return Err(PhysicsError::NonFiniteState.into());
            }
            ids.push(world.add_particle(p.with_velocity(r.velocity)));
        }

        for r in &self.constraints {
            let c: Constraint<F> = match r {
                ConstraintRecord::Distance(link) => rebuild_link(&ids, link)?.into(),
                ConstraintRecord::Pin { particle, anchor } => {
                    PinConstraint::new(resolve_index(&ids, *particle)?, *anchor).into()
                }
                ConstraintRecord::Spring { a, b, rest_length, stiffness, damping, max_force } => {
                    let mut s = SpringConstraint::new(resolve_index(&ids, *a)?, resolve_index(&ids, *b)?, *rest_length, *stiffness)
                        .with_max_force(*max_force);
                    s.damping = *damping;
                    s.into()
                }
            };
            world.add_constraint(c)?;
        }

        for r in &self.groups {
            let group: Group<F> = match r {
                GroupRecord::Cloth { cols, rows, particles, tear_factor, links } => {
                    if cols.checked_mul(*rows) != Some(particles.len()) {
                        return Err(PhysicsError::InvalidGridDimensions.into());
                    }
                    let cells = particles
                        .iter()
                        .map(|cell| cell.map(|i| resolve_index(&ids, i)).transpose())
                        .collect::<Result<Vec<_>, _>>()?;
                    let links = links
                        .iter()
                        .map(|l| rebuild_link(&ids, l))
                        .collect::<Result<Vec<_>, _>>()?;
                    Cloth::from_parts(cells, links, *cols, *rows, *tear_factor).into()
                }
                GroupRecord::RigidBody { particles, rest_offsets, stiffness, fixed } => {
                    if particles.is_empty() {
                        return Err(PhysicsError::EmptyGroup.into());
                    }
                    if particles.len() != rest_offsets.len() {
                        return Err(SnapshotError::IndexOutOfRange {
                            index: particles.len().max(rest_offsets.len()) - 1,
                            count: particles.len().min(rest_offsets.len()),
                        });
                    }
                    let members = particles
                        .iter()
                        .map(|&i| resolve_index(&ids, i))
                        .collect::<Result<Vec<_>, _>>()?;
                    RigidBody::from_parts(members, rest_offsets.clone(), *stiffness, *fixed).into()
                }
            };
            world.insert_group(group);
        }

        Ok(world)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), particles = self.particles.len(), "snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), particles = snapshot.particles.len(), "snapshot loaded");
        Ok(snapshot)
    }
}

impl<F: Float> World<F> {
    pub fn snapshot(&self) -> WorldSnapshot<F> {
        WorldSnapshot::capture(self)
    }

    /// Write the world to `path` as JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.snapshot().save(path)
    }

    /// Read a world previously written with [`World::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        WorldSnapshot::load(path)?.restore()
    }
}
