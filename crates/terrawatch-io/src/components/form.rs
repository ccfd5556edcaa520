//! Locality name input and submit button.

use dioxus::prelude::*;

/// Props for the [`LocalityForm`] component.
#[derive(Props, Clone, PartialEq)]
pub struct LocalityFormProps {
    /// Whether a submission would be accepted right now.
    enabled: bool,
    /// Called with the raw (untrimmed) input on submit.
    on_submit: EventHandler<String>,
}

/// A single-field form. The button is disabled while a run is active.
#[component]
pub fn LocalityForm(props: LocalityFormProps) -> Element {
    let mut name = use_signal(String::new);
    let on_submit = props.on_submit;

    let button_label = if props.enabled { "Analyse" } else { "Analysing..." };

    rsx! {
        form {
            class: "locality-form",
            onsubmit: move |evt: FormEvent| {
                evt.prevent_default();
                on_submit.call(name());
            },
            label { r#for: "locality", "Locality" }
            input {
                id: "locality",
                r#type: "text",
                placeholder: "e.g. Katana",
                value: "{name}",
                oninput: move |evt| name.set(evt.value()),
            }
            button {
                r#type: "submit",
                disabled: !props.enabled,
                "{button_label}"
            }
        }
    }
}
