//! ntdll memory-list requests

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;
use tracing::debug;

use crate::platform::codes::{MemoryListCommand, SystemInformationClass};
use crate::platform::{FacilityError, FacilityResult};

#[link(name = "ntdll")]
extern "system" {
    fn NtSetSystemInformation(
        system_information_class: i32,
        system_information: *mut c_void,
        system_information_length: u32,
    ) -> i32;
}

/// `MEMORY_COMBINE_INFORMATION_EX`
#[repr(C)]
struct MemoryCombineInformationEx {
    handle: *mut c_void,
    pages_combined: usize,
    flags: u32,
}

fn set_information(
    class: SystemInformationClass,
    buffer: *mut c_void,
    length: u32,
) -> FacilityResult<()> {
    let status = unsafe { NtSetSystemInformation(class.code(), buffer, length) };
    debug!("NtSetSystemInformation({:?}) -> 0x{:08X}", class, status as u32);
    FacilityError::check_ntstatus(status, &format!("{:?}", class))
}

/// Issue one `SystemMemoryListInformation` command.
///
/// Requires `SeProfileSingleProcessPrivilege`.
pub fn memory_list_command(command: MemoryListCommand) -> FacilityResult<()> {
    let mut code = command.code();
    set_information(
        SystemInformationClass::MemoryListInformation,
        &mut code as *mut i32 as *mut c_void,
        size_of::<i32>() as u32,
    )
}

/// Flush the registry's in-memory cache. Windows 8.1 and later.
pub fn reconcile_registry() -> FacilityResult<()> {
    set_information(
        SystemInformationClass::RegistryReconciliationInformation,
        ptr::null_mut(),
        0,
    )
}

/// Combine identical physical pages. Windows 10 and later.
///
/// Returns the number of pages combined.
pub fn combine_physical_memory() -> FacilityResult<usize> {
    let mut info = MemoryCombineInformationEx {
        handle: ptr::null_mut(),
        pages_combined: 0,
        flags: 0,
    };
    set_information(
        SystemInformationClass::CombinePhysicalMemoryInformation,
        &mut info as *mut MemoryCombineInformationEx as *mut c_void,
        size_of::<MemoryCombineInformationEx>() as u32,
    )?;
    Ok(info.pages_combined)
}
