//! Reminder message templates.
//!
//! Pure functions: (kind, client, override) → text. No I/O, fully
//! deterministic. The bodies are the Spanish texts the billing frontend
//! has always sent; the `*…*` markers are the transport's bold syntax.

use cobranza_core::{Client, MessageKind};

/// Render the message for a client. A non-empty `override_text` is sent
/// verbatim for every kind; `Custom` without an override gets a
/// placeholder body.
pub fn render_message(kind: MessageKind, client: &Client, override_text: Option<&str>) -> String {
    if let Some(text) = override_text
        && !text.trim().is_empty()
    {
        return text.to_string();
    }

    let monto = client.monto();
    match kind {
        MessageKind::FirstReminder => first_reminder(client, &monto, "próximos días"),
        MessageKind::SecondReminder => {
            let dias = client.dias_vencido.unwrap_or(3);
            let plural = if dias > 1 { "s" } else { "" };
            format!(
                "👋 Hola *{}*,\n\n\
                 ⚠️ *RECORDATORIO DE PAGO*\n\n\
                 Notamos que su pago de *${monto}* tiene un retraso de *{dias} día{plural}*.\n\n\
                 🙏 Le invitamos a realizarlo a la brevedad para seguir disfrutando de su servicio sin interrupciones.\n\n\
                 ¿Ya realizó el pago? Por favor envíenos el comprobante. 📸",
                client.nombre
            )
        }
        MessageKind::FinalReminder => format!(
            "🛑 *AVISO URGENTE*\n\n\
             Estimado/a *{}*,\n\n\
             Su saldo vencido es de: *${monto}*\n\n\
             ⚠️ Su servicio está próximo a ser suspendido. Por favor regularice su situación hoy mismo.\n\n\
             Si ya pagó, haga caso omiso de este mensaje.",
            client.nombre
        ),
        MessageKind::GenericNotice => format!(
            "👋 Hola *{}*,\n\n\
             ⚠️ *AVISO DE SALDO PENDIENTE*\n\n\
             Le informamos que presenta un saldo vencido de *${monto}*.\n\n\
             🔌 Para evitar la suspensión del servicio, le sugerimos realizar su pago lo antes posible.\n\n\
             Gracias por su atención.",
            client.nombre
        ),
        MessageKind::Suspension => format!(
            "Hola {},\n\n\
             ⚠️ *AVISO DE SUSPENSIÓN*\n\n\
             Le informamos que su servicio ha sido *suspendido* por falta de pago.\n\
             Por favor realice su pago para restablecer el servicio inmediatamente.",
            client.nombre
        ),
        MessageKind::Reactivation => format!(
            "Hola {},\n\n\
             ✅ *SERVICIO REACTIVADO*\n\n\
             Su pago ha sido procesado exitosamente y su servicio ha sido restablecido.\n\
             ¡Gracias por su preferencia!",
            client.nombre
        ),
        MessageKind::Termination => format!(
            "Hola {},\n\n\
             ℹ️ *AVISO DE BAJA*\n\n\
             Le confirmamos que su contrato ha sido dado de baja correctamente.\n\
             Lamentamos verle partir y esperamos poder servirle nuevamente en el futuro.",
            client.nombre
        ),
        MessageKind::Custom => format!(
            "Hola {},\n\n(mensaje personalizado no proporcionado)",
            client.nombre
        ),
    }
}

fn first_reminder(client: &Client, monto: &str, vencimiento_default: &str) -> String {
    let vencimiento = client
        .vencimiento
        .as_deref()
        .unwrap_or(vencimiento_default);
    format!(
        "👋 Hola *{}*,\n\n\
         📝 Le recordamos amablemente su próximo pago del servicio de internet.\n\n\
         💰 *Monto a pagar:* ${monto}\n\
         📅 *Fecha límite:* {vencimiento}\n\n\
         ✨ Agradecemos su puntualidad. ¡Que tenga un excelente día!",
        client.nombre
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            nombre: "María López".into(),
            telefono: "5512345678".into(),
            saldo: Some(-350.0),
            vencimiento: Some("15/09/2026".into()),
            dias_vencido: Some(5),
        }
    }

    #[test]
    fn test_first_reminder_includes_amount_and_due_date() {
        let text = render_message(MessageKind::FirstReminder, &client(), None);
        assert!(text.contains("María López"));
        assert!(text.contains("$350.00"));
        assert!(text.contains("15/09/2026"));
    }

    #[test]
    fn test_first_reminder_default_due_date() {
        let mut c = client();
        c.vencimiento = None;
        let text = render_message(MessageKind::FirstReminder, &c, None);
        assert!(text.contains("próximos días"));
    }

    #[test]
    fn test_second_reminder_pluralizes_days() {
        let text = render_message(MessageKind::SecondReminder, &client(), None);
        assert!(text.contains("5 días"));

        let mut c = client();
        c.dias_vencido = Some(1);
        let text = render_message(MessageKind::SecondReminder, &c, None);
        assert!(text.contains("1 día*"));
    }

    #[test]
    fn test_second_reminder_defaults_to_three_days() {
        let mut c = client();
        c.dias_vencido = None;
        let text = render_message(MessageKind::SecondReminder, &c, None);
        assert!(text.contains("3 días"));
    }

    #[test]
    fn test_override_wins() {
        let text = render_message(
            MessageKind::FinalReminder,
            &client(),
            Some("Texto especial"),
        );
        assert_eq!(text, "Texto especial");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let text = render_message(MessageKind::Suspension, &client(), Some("   "));
        assert!(text.contains("AVISO DE SUSPENSIÓN"));
    }

    #[test]
    fn test_custom_override_is_sent_verbatim() {
        let text = render_message(MessageKind::Custom, &client(), Some("Pago recibido."));
        assert_eq!(text, "Pago recibido.");
    }

    #[test]
    fn test_custom_without_override_uses_placeholder() {
        let text = render_message(MessageKind::Custom, &client(), None);
        assert!(text.contains("mensaje personalizado no proporcionado"));
    }

    #[test]
    fn test_deterministic() {
        let a = render_message(MessageKind::GenericNotice, &client(), None);
        let b = render_message(MessageKind::GenericNotice, &client(), None);
        assert_eq!(a, b);
    }
}
