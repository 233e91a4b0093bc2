//! Simulation errors.

use memfree_common::LayoutError;
use thiserror::Error;

/// A scenario step the simulated MCU cannot carry out.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("invalid memory layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("stack overflow: {size} byte frame at SP {sp:#06x} would cross heap floor {floor:#06x}")]
    StackOverflow { sp: usize, size: usize, floor: usize },

    #[error("heap exhausted: {requested} bytes requested, {available} available below the malloc margin")]
    HeapExhausted { requested: usize, available: usize },

    #[error("return without a matching call")]
    ReturnWithoutCall,

    #[error("allocation {0} does not exist or was already freed")]
    UnknownAllocation(usize),

    #[error("address {0:#06x} is outside the stack region")]
    AddressOutOfRange(usize),
}
