//! Service Control Manager access for the local machine.

#![cfg(windows)]

use windows::Win32::Security::SC_HANDLE;
use windows::Win32::System::Services::{
    ChangeServiceConfigW, CloseServiceHandle, ControlService, ENUM_SERVICE_TYPE, OpenSCManagerW,
    OpenServiceW, QueryServiceStatus, SC_MANAGER_ALL_ACCESS, SERVICE_ALL_ACCESS,
    SERVICE_AUTO_START, SERVICE_CONTROL_STOP, SERVICE_DISABLED, SERVICE_ERROR, SERVICE_NO_CHANGE,
    SERVICE_STATUS, StartServiceW,
};
use windows::core::{HSTRING, PCWSTR};

use crate::core::{ServiceHandle, ServiceManager, ServiceOp, ServiceState, StartMode, ToggleError};

/// Owned SCM handle, closed on drop.
struct ScHandle(SC_HANDLE);

impl Drop for ScHandle {
    fn drop(&mut self) {
        unsafe { _ = CloseServiceHandle(self.0) };
    }
}

pub struct LocalScm {
    handle: ScHandle,
}

impl LocalScm {
    pub fn connect() -> Result<Self, ToggleError> {
        let handle = unsafe { OpenSCManagerW(None, None, SC_MANAGER_ALL_ACCESS) }
            .map_err(|e| ToggleError::OpenManager(e.message().to_string()))?;
        Ok(LocalScm {
            handle: ScHandle(handle),
        })
    }
}

impl ServiceManager for LocalScm {
    type Service = Service;

    fn open_service(&self, name: &str) -> Result<Service, ToggleError> {
        let name_w = HSTRING::from(name);
        let handle = unsafe {
            OpenServiceW(self.handle.0, PCWSTR(name_w.as_ptr()), SERVICE_ALL_ACCESS)
        }
        .map_err(|e| ToggleError::OpenService {
            name: name.to_string(),
            reason: e.message().to_string(),
        })?;
        Ok(Service {
            handle: ScHandle(handle),
        })
    }
}

pub struct Service {
    handle: ScHandle,
}

fn op_error(op: ServiceOp) -> impl FnOnce(windows::core::Error) -> ToggleError {
    move |e| ToggleError::Operation {
        op,
        reason: e.message().to_string(),
    }
}

impl ServiceHandle for Service {
    fn query_state(&self) -> Result<ServiceState, ToggleError> {
        let mut status = SERVICE_STATUS::default();
        unsafe { QueryServiceStatus(self.handle.0, &mut status) }
            .map_err(|e| ToggleError::QueryStatus(e.message().to_string()))?;
        Ok(ServiceState::from_raw(status.dwCurrentState.0))
    }

    fn stop(&self) -> Result<(), ToggleError> {
        let mut status = SERVICE_STATUS::default();
        unsafe { ControlService(self.handle.0, SERVICE_CONTROL_STOP, &mut status) }
            .map_err(op_error(ServiceOp::Stop))
    }

    fn set_start_mode(&self, mode: StartMode) -> Result<(), ToggleError> {
        let start_type = match mode {
            StartMode::Automatic => SERVICE_AUTO_START,
            StartMode::Disabled => SERVICE_DISABLED,
        };
        unsafe {
            ChangeServiceConfigW(
                self.handle.0,
                ENUM_SERVICE_TYPE(SERVICE_NO_CHANGE),
                start_type,
                SERVICE_ERROR(SERVICE_NO_CHANGE),
                PCWSTR::null(),
                PCWSTR::null(),
                None,
                PCWSTR::null(),
                PCWSTR::null(),
                PCWSTR::null(),
                PCWSTR::null(),
            )
        }
        .map_err(op_error(ServiceOp::SetStartMode(mode)))
    }

    fn start(&self) -> Result<(), ToggleError> {
        unsafe { StartServiceW(self.handle.0, None) }.map_err(op_error(ServiceOp::Start))
    }
}
