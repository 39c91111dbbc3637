pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        pub const SURFACE2: Color = Color::Rgb(108, 112, 134);  // Subtle dim

        // Accents
        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const GREEN: Color = Color::Rgb(166, 227, 161);
        pub const YELLOW: Color = Color::Rgb(249, 226, 175);
        pub const BLUE: Color = Color::Rgb(137, 180, 250);
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);
        pub const PEACH: Color = Color::Rgb(250, 179, 135);
        pub const TEAL: Color = Color::Rgb(148, 226, 213);
        pub const SKY: Color = Color::Rgb(137, 220, 235);
        pub const PINK: Color = Color::Rgb(245, 194, 231);
        pub const LAVENDER: Color = Color::Rgb(180, 190, 254);

        /// Bracket colors by nesting level, cycling past the last one.
        pub const NESTING: [Color; 4] = [Self::MAUVE, Self::BLUE, Self::PINK, Self::LAVENDER];
    }
}
