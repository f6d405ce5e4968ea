//! Framed request/response loop for an out-of-process front-end

use anyhow::Result;
use app_core::{dispatch, AppError, AppState};
use ipc_proto::{read_frame, write_frame, Envelope, ProtoError, Request, Response};
use std::io::{Read, Write};

/// Answer requests until end of stream or a `Shutdown` request
///
/// An undecodable frame gets a `Protocol` error reply under the nil id and
/// the loop keeps reading.
pub fn serve<R: Read, W: Write>(state: &AppState, reader: &mut R, writer: &mut W) -> Result<()> {
    tracing::info!("Serving framed requests");
    let mut handled = 0usize;

    loop {
        let envelope = match read_frame::<_, Envelope<Request>>(reader) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(e @ ProtoError::Malformed { .. }) => {
                tracing::warn!("Rejected request frame: {}", e);
                write_frame(writer, &Envelope::unaddressed(Response::protocol_error(&e)))
                    .map_err(AppError::from)?;
                continue;
            }
            Err(e) => return Err(AppError::from(e).into()),
        };

        let Envelope { id, body } = envelope;
        let shutdown = body == Request::Shutdown;
        let response = dispatch::handle(state, body);
        write_frame(writer, &Envelope { id, body: response }).map_err(AppError::from)?;
        handled += 1;

        if shutdown {
            break;
        }
    }

    tracing::info!("Serve loop finished after {} requests", handled);
    Ok(())
}
