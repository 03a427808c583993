//! Dispatch loop
//!
//! Walks the registry in order and runs the handler of every parameter that
//! was passed and has not already run (handlers may have been run earlier
//! by lazy resolution). The first terminal handler to succeed ends the walk.
//! Failures go through the session's force policy.

use anyhow::Result;
use std::io::Write;
use tracing::debug;

use crate::error::KiaError;
use crate::handlers::Flow;
use crate::params::ParamId;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Parameters run by the loop itself, in order
    pub invoked: Vec<ParamId>,
    /// The terminal parameter that ended the walk, if any
    pub terminated_by: Option<ParamId>,
}

enum State {
    Scanning(usize),
    Invoking(usize, ParamId),
    Done(Option<ParamId>),
}

pub fn run<W: Write>(session: &mut Session<W>) -> Result<Outcome> {
    let order = session.registry().order();
    let mut invoked = Vec::new();
    let mut state = State::Scanning(0);

    let terminated_by = loop {
        state = match state {
            State::Scanning(index) => match order.get(index) {
                None => State::Done(None),
                Some(&id) if session.registry().is_pending(id) => State::Invoking(index, id),
                Some(_) => State::Scanning(index + 1),
            },
            State::Invoking(index, id) => {
                invoked.push(id);
                match session.invoke(id) {
                    Ok(Flow::Stop) => State::Done(Some(id)),
                    Ok(Flow::Continue) => State::Scanning(index + 1),
                    Err(err) => {
                        session.recover(err)?;
                        State::Scanning(index + 1)
                    }
                }
            }
            State::Done(terminated_by) => break terminated_by,
        };
    };

    if !session.registry().any_invoked() {
        return Err(KiaError::NoParameters.into());
    }

    debug!(
        "Dispatch finished after {} handler(s), terminated by {:?}",
        invoked.len(),
        terminated_by
    );
    Ok(Outcome {
        invoked,
        terminated_by,
    })
}
