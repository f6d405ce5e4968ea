//! Request dispatcher
//!
//! Maps protocol requests onto engine calls. Each request runs under one
//! acquisition of the engine lock.

use crate::AppState;
use app_fs::FsError;
use ipc_proto::{Request, Response};

/// Handle one request against the shared engine
pub fn handle(state: &AppState, request: Request) -> Response {
    tracing::debug!("Dispatching {:?}", RequestName(&request));

    let result: Result<Response, FsError> = match request {
        Request::List { path } => state.with_fs(|fs| fs.list(&path)).map(|entries| Response::Listing { entries }),
        Request::Resolve { path } => state.with_fs(|fs| fs.resolve(&path)).map(|kind| Response::Resolved { kind }),
        Request::ReadFile { path, name } => state
            .with_fs(|fs| fs.read_file(&path, &name))
            .map(|content| Response::Content { content }),
        Request::Save {
            path,
            name,
            content,
            is_new_file,
        } => state
            .with_fs(|fs| fs.save(&path, &name, content, is_new_file))
            .map(|_| Response::Done),
        Request::CreateFile { path, name, content } => state
            .with_fs(|fs| fs.create_file(&path, &name, content))
            .map(|_| Response::Done),
        Request::CreateFolder { path, name } => state
            .with_fs(|fs| fs.create_folder(&path, &name))
            .map(|_| Response::Done),
        Request::Rename { path, old_name, new_name } => state
            .with_fs(|fs| fs.rename(&path, &old_name, &new_name))
            .map(|_| Response::Done),
        Request::Move { from, name, to } => state
            .with_fs(|fs| fs.move_entry(&from, &name, &to))
            .map(|_| Response::Done),
        Request::Delete { path, name } => state
            .with_fs(|fs| fs.delete_to_recycle_bin(&path, &name))
            .map(|token| Response::Deleted { token }),
        Request::Restore { token, on_conflict } => state
            .with_fs(|fs| fs.restore(&token, on_conflict))
            .map(|outcome| Response::Restored {
                final_name: outcome.final_name,
                path: outcome.path,
                fell_back_to_root: outcome.fell_back_to_root,
            }),
        Request::Purge { token } => state.with_fs(|fs| fs.purge(&token)).map(|_| Response::Done),
        Request::EmptyBin => Ok(Response::Emptied {
            count: state.with_fs(|fs| fs.empty_bin()),
        }),
        Request::ListBin => Ok(Response::BinListing {
            items: state.with_fs(|fs| fs.recycle_bin_items()),
        }),
        Request::Usage => Ok(Response::Usage {
            report: state.with_fs(|fs| fs.usage_report()),
        }),
        Request::Ping => Ok(Response::Pong),
        Request::Shutdown => Ok(Response::Bye),
    };

    result.unwrap_or_else(|e| {
        tracing::debug!("Request failed: {}", e);
        Response::from_error(&e)
    })
}

/// Logs a request by variant without dumping file contents
struct RequestName<'a>(&'a Request);

impl std::fmt::Debug for RequestName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            Request::List { .. } => "List",
            Request::Resolve { .. } => "Resolve",
            Request::ReadFile { .. } => "ReadFile",
            Request::Save { .. } => "Save",
            Request::CreateFile { .. } => "CreateFile",
            Request::CreateFolder { .. } => "CreateFolder",
            Request::Rename { .. } => "Rename",
            Request::Move { .. } => "Move",
            Request::Delete { .. } => "Delete",
            Request::Restore { .. } => "Restore",
            Request::Purge { .. } => "Purge",
            Request::EmptyBin => "EmptyBin",
            Request::ListBin => "ListBin",
            Request::Usage => "Usage",
            Request::Ping => "Ping",
            Request::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use app_fs::{ConflictPolicy, EntryKind, VfsPath};
    use ipc_proto::ErrorCode;

    fn state() -> AppState {
        AppState::new(AppConfig::default()).unwrap()
    }

    #[test]
    fn test_list_and_resolve() {
        let state = state();
        match handle(&state, Request::List { path: VfsPath::root() }) {
            Response::Listing { entries } => {
                let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["Documents", "Images"]);
            }
            other => panic!("Unexpected response: {:?}", other),
        }

        assert_eq!(
            handle(&state, Request::Resolve { path: VfsPath::parse("/Documents") }),
            Response::Resolved { kind: EntryKind::Folder }
        );
    }

    #[test]
    fn test_delete_restore_round() {
        let state = state();
        let token = match handle(
            &state,
            Request::Delete {
                path: VfsPath::parse("/Documents"),
                name: "my_first_file.txt".into(),
            },
        ) {
            Response::Deleted { token } => token,
            other => panic!("Unexpected response: {:?}", other),
        };

        match handle(
            &state,
            Request::Restore {
                token,
                on_conflict: ConflictPolicy::Rename,
            },
        ) {
            Response::Restored {
                final_name,
                fell_back_to_root,
                ..
            } => {
                assert_eq!(final_name, "my_first_file.txt");
                assert!(!fell_back_to_root);
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_errors_become_codes() {
        let mut config = AppConfig::default();
        config.storage.limit_bytes = 20;
        let state = AppState::new(config).unwrap();

        let response = handle(
            &state,
            Request::Save {
                path: VfsPath::root(),
                name: "big.bin".into(),
                content: vec![0u8; 16],
                is_new_file: true,
            },
        );
        assert!(matches!(
            response,
            Response::Error {
                code: ErrorCode::StorageFull,
                ..
            }
        ));

        let response = handle(&state, Request::Purge { token: "missing".into() });
        assert!(matches!(
            response,
            Response::Error {
                code: ErrorCode::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_ping_and_shutdown() {
        let state = state();
        assert_eq!(handle(&state, Request::Ping), Response::Pong);
        assert_eq!(handle(&state, Request::Shutdown), Response::Bye);
    }
}
