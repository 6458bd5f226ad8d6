use crate::types::GestureClass;

/// Posición lógica de la compuerta: lo que el sistema cree que hizo el servo,
/// no una lectura física. Evita reenviar comandos mientras el gesto se
/// mantiene por encima del umbral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePosition {
    Cerrado,
    Abierto,
}

/// Máquina de estados de debounce.
///
/// Cuenta frames consecutivos de cada gesto "fuera de neutral". Una
/// transición se confirma cuando el contador supera estrictamente el umbral
/// (`> umbral`, no `>=`) Y la posición lógica todavía no refleja el destino.
///
/// El protocolo es en dos fases: `update` devuelve el destino a comandar y
/// NO muta la posición; el llamador invoca `confirm` solo si el actuador
/// respondió bien. Si el comando falla, el gesto aún sostenido vuelve a
/// superar la comparación en el siguiente frame y se reintenta.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    frames_cerrar: u32,
    frames_abrir: u32,
    position: GatePosition,
    umbral: u32,
}

impl DebounceGate {
    /// La posición lógica arranca en `Cerrado`.
    pub fn new(umbral: u32) -> Self {
        Self {
            frames_cerrar: 0,
            frames_abrir: 0,
            position: GatePosition::Cerrado,
            umbral,
        }
    }

    /// Alimenta la clase seleccionada de este frame.
    ///
    /// - `Neutral`: ambos contadores a 0, nunca hay comando.
    /// - `Cerrar` / `Abrir`: pone a cero el contador del gesto contrario e
    ///   incrementa el propio (como mucho uno de los dos es distinto de cero).
    ///
    /// Devuelve `Some(destino)` cuando corresponde emitir un comando. Los
    /// contadores saturan: pasado el umbral solo importa la comparación.
    pub fn update(&mut self, class: GestureClass) -> Option<GatePosition> {
        match class {
            GestureClass::Neutral => {
                self.frames_cerrar = 0;
                self.frames_abrir = 0;
                None
            }
            GestureClass::Cerrar => {
                self.frames_abrir = 0;
                self.frames_cerrar = self.frames_cerrar.saturating_add(1);
                if self.frames_cerrar > self.umbral && self.position == GatePosition::Abierto {
                    Some(GatePosition::Cerrado)
                } else {
                    None
                }
            }
            GestureClass::Abrir => {
                self.frames_cerrar = 0;
                self.frames_abrir = self.frames_abrir.saturating_add(1);
                if self.frames_abrir > self.umbral && self.position == GatePosition::Cerrado {
                    Some(GatePosition::Abierto)
                } else {
                    None
                }
            }
        }
    }

    /// Registra que el actuador completó el movimiento hacia `target`.
    pub fn confirm(&mut self, target: GatePosition) {
        self.position = target;
    }

    pub fn position(&self) -> GatePosition {
        self.position
    }

    pub fn umbral(&self) -> u32 {
        self.umbral
    }
}
