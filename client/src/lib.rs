//! # Monster Sync Client Library
//!
//! Client-side core for a networked action game: it keeps a local mirror of
//! the players and monsters the server reports, smooths their movement
//! between updates, and runs monster behavior trees that act on server
//! commands.
//!
//! ## Architecture Overview
//!
//! Two execution contexts cooperate:
//!
//! ### Receive task
//! A background tokio task reads length-prefixed frames from the TCP stream,
//! decodes them with the shared codec and pushes the results onto a bounded
//! dispatch queue. It never touches simulation state.
//!
//! ### Simulation tick
//! Once per tick the simulation drains the queue, applies every message in
//! arrival order, advances interpolation, ticks behavior trees and publishes
//! transforms and animation flags to the presentation layer.
//!
//! ## Module Organization
//!
//! - `config`: client settings and interpolation tuning
//! - `transport`: TCP connection, framing on the read side, serialized sends
//! - `dispatch`: bounded, order-preserving hand-off between the two contexts
//! - `registry`: entity ownership with non-reusable handles
//! - `interpolation`: per-entity position blending and heading easing
//! - `bt`: behavior tree runtime (composites, decorators, selectors)
//! - `ai`: monster conditions, actions and ready-made archetypes
//! - `collaborators`: traits for presentation, effects and audio
//! - `game`: the simulation that ties everything together
//! - `network`: the headless client loop with reconnect handling
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::collaborators::Collaborators;
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! config.validate()?;
//!
//! let mut client = Client::new(config, Collaborators::logging()).await?;
//! client.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod bt;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod game;
pub mod interpolation;
pub mod network;
pub mod registry;
pub mod transport;
