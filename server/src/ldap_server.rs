use crate::configuration::Configuration;
use actix_rt::net::TcpStream;
use actix_server::ServerBuilder;
use actix_service::{ServiceFactoryExt, fn_service};
use anyhow::{Context, Result};
use ldap3_proto::{LdapCodec, control::LdapControl, proto::LdapMsg};
use ldaptest_ldap::{LdapHandler, LdapInfo};
use std::sync::Arc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

#[instrument(skip_all, level = "info", name = "LDAP request", fields(session_id = %session.session_uuid()))]
async fn handle_ldap_message<Writer>(
    msg: Result<LdapMsg, std::io::Error>,
    resp: &mut Writer,
    session: &mut LdapHandler,
) -> Result<bool>
where
    Writer: futures_util::Sink<LdapMsg> + Unpin,
    <Writer as futures_util::Sink<LdapMsg>>::Error: std::error::Error + Send + Sync + 'static,
{
    use futures_util::SinkExt;
    let msg = msg.context("while receiving LDAP op")?;
    for control in msg.ctrl.iter() {
        if let LdapControl::Unknown { oid, .. } = control {
            info!("Received unknown control: {}, ignoring", oid);
        }
    }
    debug!(?msg);
    match session.handle_ldap_message(msg.op) {
        None => return Ok(false),
        Some(result) => {
            for response in result.into_iter() {
                debug!(?response);
                resp.send(LdapMsg {
                    msgid: msg.msgid,
                    op: response,
                    ctrl: vec![],
                })
                .await
                .context("while sending a response")?
            }

            resp.flush().await.context("while flushing responses")?
        }
    }
    Ok(true)
}

async fn handle_ldap_stream<Stream>(stream: Stream, ldap_info: Arc<LdapInfo>) -> Result<Stream>
where
    Stream: tokio::io::AsyncRead + tokio::io::AsyncWrite + std::marker::Unpin,
{
    use tokio_stream::StreamExt;
    let (r, w) = tokio::io::split(stream);
    let mut requests = FramedRead::new(r, LdapCodec::default());
    let mut resp = FramedWrite::new(w, LdapCodec::default());

    let session_uuid = Uuid::new_v4();
    let mut session = LdapHandler::new(ldap_info, session_uuid);

    info!("LDAP session start: {}", session_uuid);
    while let Some(msg) = requests.next().await {
        if !handle_ldap_message(msg, &mut resp, &mut session)
            .await
            .context("while handling incoming messages")?
        {
            break;
        }
    }
    info!("LDAP session end: {}", session_uuid);
    Ok(requests.into_inner().unsplit(resp.into_inner()))
}

pub fn build_ldap_server(
    config: &Configuration,
    ldap_info: LdapInfo,
    server_builder: ServerBuilder,
) -> Result<ServerBuilder> {
    let ldap_info = Arc::new(ldap_info);

    let binder = move || {
        let ldap_info = ldap_info.clone();
        fn_service(move |stream: TcpStream| {
            let ldap_info = ldap_info.clone();
            async move { handle_ldap_stream(stream, ldap_info).await }
        })
        .map_err(|err: anyhow::Error| error!("[LDAP] Service Error: {:#}", err))
    };

    info!(
        "Starting the LDAP server on {}:{}",
        config.ldap_host, config.ldap_port
    );
    server_builder
        .bind("ldap", (config.ldap_host.clone(), config.ldap_port), binder)
        .with_context(|| {
            format!(
                "while binding to {}:{}",
                config.ldap_host, config.ldap_port
            )
        })
}
