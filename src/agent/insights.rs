use super::os::SystemStatus;

const RAM_WARN_PERCENT: f32 = 80.0;
const CPU_WARN_PERCENT: f32 = 70.0;
const DISK_WARN_PERCENT: f32 = 85.0;

/// Short tips derived from machine load and time of day.
pub fn productivity_suggestions(status: &SystemStatus, hour: u32) -> Vec<String> {
    let mut tips = Vec::new();

    if status.mem_percent() > RAM_WARN_PERCENT {
        tips.push("Sua RAM está quase cheia! Que tal fechar alguns programas? 🧠".to_string());
    }
    if status.cpu_percent > CPU_WARN_PERCENT {
        tips.push("O processador está trabalhando pesado. Talvez seja hora de uma pausa! 🔥".to_string());
    }
    if status.disk_percent() > DISK_WARN_PERCENT {
        tips.push("Seu disco está ficando cheio. Bora fazer uma limpeza? 💾".to_string());
    }

    if (12..=14).contains(&hour) {
        tips.push("Já almoçou? Não esquece de comer direitinho! 🍽️".to_string());
    } else if hour >= 22 {
        tips.push("Tá ficando tarde... não esquece de descansar! 😴".to_string());
    }

    if tips.is_empty() {
        tips.push("Tudo certo por aqui! Seu sistema está rodando bem. ✨".to_string());
    }
    tips
}
