/// Número de clases del clasificador: neutral, cerrar, abrir
pub const NUM_CLASSES: usize = 3;

/// Vector de probabilidades por frame, una componente por clase.
/// La longitud fija elimina por construcción los desajustes de tamaño
/// entre el vector crudo y el suavizado.
pub type ProbVector = [f32; NUM_CLASSES];

/// Clase reconocida por el clasificador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureClass {
    /// Sin gesto (índice 0)
    Neutral,
    /// Gesto de cierre de la compuerta (índice 1)
    Cerrar,
    /// Gesto de apertura de la compuerta (índice 2)
    Abrir,
}

impl GestureClass {
    pub fn index(self) -> usize {
        match self {
            GestureClass::Neutral => 0,
            GestureClass::Cerrar => 1,
            GestureClass::Abrir => 2,
        }
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => GestureClass::Neutral,
            1 => GestureClass::Cerrar,
            _ => GestureClass::Abrir,
        }
    }
}

/// Selecciona la clase con mayor probabilidad.
///
/// En caso de empate exacto gana el índice más bajo (recorrido ascendente con
/// comparación estricta). Determinista: los contadores de debounce dependen
/// de que la misma entrada produzca siempre la misma clase.
pub fn select_class(probs: &ProbVector) -> GestureClass {
    let mut best_idx = 0;
    let mut best_val = probs[0];
    for (idx, &val) in probs.iter().enumerate().skip(1) {
        if val > best_val {
            best_idx = idx;
            best_val = val;
        }
    }
    GestureClass::from_index(best_idx)
}

/// Frame crudo RGB24 tal como llega de la fuente de captura
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    /// Píxeles empaquetados RGB, fila a fila: width * height * 3 bytes
    pub pixels: Vec<u8>,
}

impl RawFrame {
    pub fn byte_len(width: usize, height: usize) -> usize {
        width * height * 3
    }
}
