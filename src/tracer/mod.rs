//! Progressive Monte-Carlo ray tracer.
//!
//! A tracer invocation is a pure function of the layout, simulation size, and
//! segment budget: it walks rays from the lights through reflection,
//! refraction, and absorption, and returns the lit segments it produced.
//! Multiple tracers may run concurrently over one shared layout.

mod fresnel;
mod ray;
mod trace;


pub use ray::LightSegment;

pub(crate) use trace::trace;
