//! DVI opcode values and operand layout.

pub const SET_CHAR_0: u8 = 0;
pub const SET_CHAR_127: u8 = 127;
/// SET1..SET4: 1..4 byte character code.
pub const SET1: u8 = 128;
pub const SET2: u8 = 129;
pub const SET3: u8 = 130;
pub const SET4: u8 = 131;
/// Height and width, four bytes each.
pub const SET_RULE: u8 = 132;
pub const PUT1: u8 = 133;
pub const PUT2: u8 = 134;
pub const PUT3: u8 = 135;
pub const PUT4: u8 = 136;
pub const PUT_RULE: u8 = 137;
pub const NOP: u8 = 138;
/// Ten `\count` registers followed by the pointer to the previous BOP.
pub const BOP: u8 = 139;
pub const EOP: u8 = 140;
pub const PUSH: u8 = 141;
pub const POP: u8 = 142;
pub const RIGHT1: u8 = 143;
pub const RIGHT2: u8 = 144;
pub const RIGHT3: u8 = 145;
pub const RIGHT4: u8 = 146;
pub const W0: u8 = 147;
pub const W1: u8 = 148;
pub const W2: u8 = 149;
pub const W3: u8 = 150;
pub const W4: u8 = 151;
pub const X0: u8 = 152;
pub const X1: u8 = 153;
pub const X2: u8 = 154;
pub const X3: u8 = 155;
pub const X4: u8 = 156;
pub const DOWN1: u8 = 157;
pub const DOWN2: u8 = 158;
pub const DOWN3: u8 = 159;
pub const DOWN4: u8 = 160;
pub const Y0: u8 = 161;
pub const Y1: u8 = 162;
pub const Y2: u8 = 163;
pub const Y3: u8 = 164;
pub const Y4: u8 = 165;
pub const Z0: u8 = 166;
pub const Z1: u8 = 167;
pub const Z2: u8 = 168;
pub const Z3: u8 = 169;
pub const Z4: u8 = 170;
pub const FNT_NUM_0: u8 = 171;
pub const FNT_NUM_63: u8 = 234;
pub const FNT1: u8 = 235;
pub const FNT2: u8 = 236;
pub const FNT3: u8 = 237;
pub const FNT4: u8 = 238;
/// Specials: 1..4 byte length, then the payload.
pub const XXX1: u8 = 239;
pub const XXX2: u8 = 240;
pub const XXX3: u8 = 241;
pub const XXX4: u8 = 242;
/// Font definitions: 1..4 byte font number, checksum, scaled size, design
/// size, area length, name length, area and name.
pub const FNT_DEF1: u8 = 243;
pub const FNT_DEF2: u8 = 244;
pub const FNT_DEF3: u8 = 245;
pub const FNT_DEF4: u8 = 246;
pub const PRE: u8 = 247;
pub const POST: u8 = 248;
pub const POST_POST: u8 = 249;
/// TeX--XeT reflection, no operands.
pub const BEGIN_REFLECT: u8 = 250;
pub const END_REFLECT: u8 = 251;
/// XeTeX native font definition.
pub const XDV_NATIVE_FONT_DEF: u8 = 252;
/// XeTeX positioned glyph run.
pub const XDV_GLYPHS: u8 = 253;
/// XeTeX text plus glyph run (id 7 only).
pub const XDV_TEXT_AND_GLYPHS: u8 = 254;
/// pTeX direction change.
pub const PTEX_DIR: u8 = 255;

/// Fill byte after the trailer id byte.
pub const PADDING: u8 = 223;

/// BOP record length including the opcode.
pub const BOP_LENGTH: usize = 45;
/// Fixed postamble length including POST, up to the first font definition.
pub const POSTAMBLE_FIXED_LENGTH: usize = 29;
/// Back-pointer value of the first page.
pub const NO_PREVIOUS_PAGE: i32 = -1;

/// Native font flag bits that add optional fields.
pub const XDV_FLAG_VERTICAL: u16 = 0x0100;
pub const XDV_FLAG_COLORED: u16 = 0x0200;
pub const XDV_FLAG_EXTEND: u16 = 0x1000;
pub const XDV_FLAG_SLANT: u16 = 0x2000;
pub const XDV_FLAG_EMBOLDEN: u16 = 0x4000;

/// Width in bytes of the numeric operand of a 1..4 variant opcode family,
/// e.g. `variant_width(FNT_DEF3, FNT_DEF1) == 3`.
pub fn variant_width(opcode: u8, first: u8) -> usize {
    (opcode - first) as usize + 1
}

/// Operand bytes that follow an opcode whose layout does not depend on the
/// operand values. `None` for opcodes with variable layout (specials, font
/// definitions, glyph runs) or opcodes not allowed inside a page.
pub fn fixed_operand_length(opcode: u8) -> Option<usize> {
    match opcode {
        SET_CHAR_0..=SET_CHAR_127 => Some(0),
        SET1..=SET4 => Some(variant_width(opcode, SET1)),
        SET_RULE | PUT_RULE => Some(8),
        PUT1..=PUT4 => Some(variant_width(opcode, PUT1)),
        NOP | EOP | PUSH | POP | W0 | X0 | Y0 | Z0 => Some(0),
        BEGIN_REFLECT | END_REFLECT => Some(0),
        BOP => Some(BOP_LENGTH - 1),
        RIGHT1..=RIGHT4 => Some(variant_width(opcode, RIGHT1)),
        W1..=W4 => Some(variant_width(opcode, W1)),
        X1..=X4 => Some(variant_width(opcode, X1)),
        DOWN1..=DOWN4 => Some(variant_width(opcode, DOWN1)),
        Y1..=Y4 => Some(variant_width(opcode, Y1)),
        Z1..=Z4 => Some(variant_width(opcode, Z1)),
        FNT_NUM_0..=FNT_NUM_63 => Some(0),
        FNT1..=FNT4 => Some(variant_width(opcode, FNT1)),
        PTEX_DIR => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_width() {
        assert_eq!(variant_width(FNT_DEF1, FNT_DEF1), 1);
        assert_eq!(variant_width(FNT_DEF4, FNT_DEF1), 4);
        assert_eq!(variant_width(XXX4, XXX1), 4);
    }

    #[test]
    fn test_fixed_operand_lengths() {
        assert_eq!(fixed_operand_length(65), Some(0));
        assert_eq!(fixed_operand_length(SET_RULE), Some(8));
        assert_eq!(fixed_operand_length(DOWN4), Some(4));
        assert_eq!(fixed_operand_length(BOP), Some(44));
        assert_eq!(fixed_operand_length(XXX1), None);
        assert_eq!(fixed_operand_length(FNT_DEF2), None);
        assert_eq!(fixed_operand_length(POST), None);
        assert_eq!(fixed_operand_length(PRE), None);
        assert_eq!(fixed_operand_length(BEGIN_REFLECT), Some(0));
        assert_eq!(fixed_operand_length(END_REFLECT), Some(0));
        assert_eq!(fixed_operand_length(FNT3), Some(3));
    }
}
