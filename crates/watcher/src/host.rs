#![forbid(unsafe_code)]

//! The boundary to the instrumentation engine that intercepts memory
//! accesses of the target. Only two capabilities are needed from it: walking
//! the instructions of a translated block, and attaching a memory callback to
//! one of them.

use std::sync::Arc;

/// One intercepted memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    /// Virtual CPU that executed the access.
    pub vcpu: u32,
    pub address: u64,
    pub is_store: bool,
}

impl MemoryAccess {
    pub fn store(vcpu: u32, address: u64) -> Self {
        Self {
            vcpu,
            address,
            is_store: true,
        }
    }

    pub fn load(vcpu: u32, address: u64) -> Self {
        Self {
            vcpu,
            address,
            is_store: false,
        }
    }
}

/// Receives every memory access of the instructions it is attached to.
///
/// Hosts may call `observe` from several virtual CPUs at once.
pub trait StoreObserver: Send + Sync {
    fn observe(&self, access: &MemoryAccess);
}

pub trait InstrumentationHost {
    type Instruction;

    fn register_memory_callback(
        &mut self,
        instruction: &Self::Instruction,
        observer: Arc<dyn StoreObserver>,
    );
}

/// Attach `observer` to every instruction of a freshly translated block.
/// Returns the number of instructions instrumented.
pub fn instrument_block<H, I>(host: &mut H, block: I, observer: &Arc<dyn StoreObserver>) -> usize
where
    H: InstrumentationHost,
    I: IntoIterator<Item = H::Instruction>,
{
    let mut count = 0;
    for instruction in block {
        host.register_memory_callback(&instruction, Arc::clone(observer));
        count += 1;
    }
    count
}
