//! Latest status message.

use dioxus::prelude::*;
use terrawatch_core::StatusEvent;

use crate::dom::format_time;

/// Props for the [`StatusBanner`] component.
#[derive(Props, Clone, PartialEq)]
pub struct StatusBannerProps {
    /// Message to show; nothing is rendered for `None`.
    event: Option<StatusEvent>,
}

/// Severity-styled banner with the message's local time.
#[component]
pub fn StatusBanner(props: StatusBannerProps) -> Element {
    let Some(event) = props.event else {
        return rsx! {};
    };
    let class = format!("status status-{}", event.severity);
    let time = format_time(event.timestamp);
    let message = event.message;

    rsx! {
        div { class: "{class}", role: "status",
            time { class: "status-time", "{time}" }
            span { class: "status-message", "{message}" }
        }
    }
}
