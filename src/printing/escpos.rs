//! ESC/POS command assembly for thermal receipt printers. Builds a raw
//! byte buffer; delivery is the transport module's job.

/// Text alignment for `ESC a`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Byte-stream builder. Methods append the corresponding command and
/// return the builder, so receipts read as one chain.
#[derive(Debug, Default)]
pub struct EscPos {
    buffer: Vec<u8>,
}

impl EscPos {
    pub fn new() -> Self {
        Self::default()
    }

    /// ESC @ - reset the printer to its power-on state
    pub fn init(mut self) -> Self {
        self.buffer.extend([0x1B, 0x40]);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.buffer.extend(text.as_bytes());
        self
    }

    pub fn newline(mut self) -> Self {
        self.buffer.push(0x0A);
        self
    }

    /// ESC E - emphasized mode on/off
    pub fn bold(mut self, enable: bool) -> Self {
        self.buffer.extend([0x1B, 0x45, u8::from(enable)]);
        self
    }

    /// ESC - - underline mode on/off
    pub fn underline(mut self, enable: bool) -> Self {
        self.buffer.extend([0x1B, 0x2D, u8::from(enable)]);
        self
    }

    /// ESC ! - select print mode. 0 is normal; bit flags select double
    /// height/width on most printers.
    pub fn font_size(mut self, size: u8) -> Self {
        self.buffer.extend([0x1B, 0x21, size]);
        self
    }

    /// ESC a - alignment for following lines
    pub fn align(mut self, alignment: Align) -> Self {
        self.buffer.extend([0x1B, 0x61, alignment as u8]);
        self
    }

    pub fn feed(mut self, lines: u8) -> Self {
        for _ in 0..lines {
            self.buffer.push(0x0A);
        }
        self
    }

    /// GS V 0 - full paper cut
    pub fn cut(mut self) -> Self {
        self.buffer.extend([0x1D, 0x56, 0x00]);
        self
    }

    /// GS ( k - QR code: select model 2, set error correction, store the
    /// payload, print. `size` is the module size in dots.
    pub fn qr_code(mut self, data: &str, size: u8) -> Self {
        self.buffer
            .extend([0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, size, 0x00]);
        self.buffer
            .extend([0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x08]);

        let payload_len = data.len() + 3;
        self.buffer.extend([
            0x1D,
            0x28,
            0x6B,
            (payload_len & 0xFF) as u8,
            ((payload_len >> 8) & 0xFF) as u8,
            0x31,
            0x50,
            0x30,
        ]);
        self.buffer.extend(data.as_bytes());

        self.buffer
            .extend([0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_emits_esc_at() {
        assert_eq!(EscPos::new().init().build(), vec![0x1B, 0x40]);
    }

    #[test]
    fn bold_toggles_with_esc_e() {
        let bytes = EscPos::new().bold(true).bold(false).build();
        assert_eq!(bytes, vec![0x1B, 0x45, 0x01, 0x1B, 0x45, 0x00]);
    }

    #[test]
    fn align_center_emits_esc_a_one() {
        assert_eq!(
            EscPos::new().align(Align::Center).build(),
            vec![0x1B, 0x61, 0x01]
        );
    }

    #[test]
    fn cut_emits_gs_v_zero() {
        assert_eq!(EscPos::new().cut().build(), vec![0x1D, 0x56, 0x00]);
    }

    #[test]
    fn feed_repeats_line_feeds() {
        assert_eq!(EscPos::new().feed(3).build(), vec![0x0A, 0x0A, 0x0A]);
    }

    #[test]
    fn text_passes_utf8_through() {
        let bytes = EscPos::new().text("Tax Invoice").newline().build();
        assert_eq!(&bytes[..11], b"Tax Invoice");
        assert_eq!(bytes[11], 0x0A);
    }

    #[test]
    fn qr_code_stores_payload_with_length_prefix() {
        let bytes = EscPos::new().qr_code("hi", 6).build();

        // Model selection with module size 6
        assert_eq!(
            &bytes[..9],
            &[0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x06, 0x00]
        );
        // Error correction level follows the model selection
        assert_eq!(&bytes[9..17], &[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x08]);
        // Store command carries payload length + 3
        assert_eq!(
            &bytes[17..27],
            &[0x1D, 0x28, 0x6B, 0x05, 0x00, 0x31, 0x50, 0x30, b'h', b'i']
        );
        // Print command terminates the sequence
        assert_eq!(
            &bytes[27..],
            &[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]
        );
    }
}
